//! Authentication and profile endpoints
//!
//! Login and registration store the returned token. Logout is local-first:
//! the token and every cached response are dropped even when the backend
//! cannot be told about it.

use crate::client::RehabClient;
use crate::endpoints::SESSION_TTL;
use crate::error::{ApiError, ApiResult};
use crate::executor::RequestConfig;
use crate::invalidation::Invalidation;
use crate::types::{EntityId, Fetched};
use rehab_core::retry::RetryConfig;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

const PROFILE_ENDPOINT: &str = "users/profile";
const PROFILE_KEY: &str = "user_profile";

/// Auth API interface
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: RehabClient,
}

impl AuthApi {
    /// Create a new auth API interface
    pub(crate) fn new(client: RehabClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password
    ///
    /// POST /auth/login
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AuthSession> {
        self.start_session("auth/login", RequestConfig::post().json(credentials)?)
            .await
    }

    /// Create an account and sign in
    ///
    /// POST /auth/register
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthSession> {
        self.start_session("auth/register", RequestConfig::post().json(request)?)
            .await
    }

    async fn start_session(&self, endpoint: &str, request: RequestConfig) -> ApiResult<AuthSession> {
        let session: AuthSession = self.client.execute(endpoint, request).await?;
        if session.token.trim().is_empty() {
            return Err(ApiError::Decode("response carried no token".to_string()));
        }

        self.client.tokens().store(&session.token).await?;
        // Per-user reads cached for a previous account must not leak into this one
        Invalidation::default()
            .key(PROFILE_KEY)
            .pattern("booking")
            .apply(self.client.cache());

        info!(endpoint, "Signed in");
        Ok(session)
    }

    /// Sign out
    ///
    /// The whole cache is dropped first. POST /auth/logout is then attempted
    /// once when a token can be read; its outcome does not matter. The token
    /// is removed last, and a storage failure is reported only after the
    /// cache is already empty.
    pub async fn logout(&self) -> ApiResult<()> {
        self.client.cache().invalidate(None);

        let signed_in = match self.client.tokens().has_token().await {
            Ok(signed_in) => signed_in,
            Err(err) => {
                warn!(error = %err, "Stored session unreadable, skipping backend logout");
                false
            }
        };
        if signed_in {
            let request = RequestConfig::post()
                .authenticated()
                .retry(RetryConfig::no_retry());
            if let Err(err) = self.client.execute::<IgnoredAny>("auth/logout", request).await {
                debug!(error = %err, "Backend logout failed, clearing session locally");
            }
        }

        self.client.tokens().clear().await?;
        info!("Signed out");
        Ok(())
    }

    /// Profile of the signed-in user
    ///
    /// GET /users/profile
    pub async fn profile(&self) -> ApiResult<Fetched<User>> {
        self.client
            .cached_get(
                PROFILE_KEY,
                PROFILE_ENDPOINT,
                RequestConfig::get().authenticated(),
                SESSION_TTL,
            )
            .await
    }

    /// Update the profile of the signed-in user
    ///
    /// PUT /users/profile
    pub async fn update_profile<B: Serialize + ?Sized>(&self, changes: &B) -> ApiResult<User> {
        self.client
            .mutate(
                PROFILE_ENDPOINT,
                RequestConfig::put().json(changes)?,
                Invalidation::default().key(PROFILE_KEY),
            )
            .await
    }

    /// Whether a token is stored
    pub async fn is_authenticated(&self) -> ApiResult<bool> {
        self.client.tokens().has_token().await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Email and password
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Plain-text password, sent only over the login call
    pub password: String,
}

impl Credentials {
    /// Credentials for one login
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Account email
    pub email: String,
    /// Plain-text password, sent only over the login call
    pub password: String,
    /// Display name
    pub name: String,
    /// Contact phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Successful login or registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token for protected calls
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: EntityId,
    /// Account email
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Every other field the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::testing::{client_with, BrokenStorage, Harness, MockTransport};
    use rehab_core::clock::ManualClock;
    use std::sync::Arc;
    use crate::token::AUTH_TOKEN_KEY;
    use crate::transport::HttpResponse;
    use rehab_core::storage::KeyValueStorage;
    use serde_json::json;

    fn backend() -> Arc<MockTransport> {
        MockTransport::new(|request| {
            let path = request.url.rsplit("/api/").next().unwrap_or_default();
            let body = match path {
                "auth/login" | "auth/register" => json!({
                    "token": "jwt-1",
                    "user": {"id": 1, "email": "anna@example.com"}
                }),
                "users/profile" => json!({"id": 1, "email": "anna@example.com", "name": "Anna"}),
                _ => json!({"ok": true}),
            };
            Ok(HttpResponse::json(200, &body))
        })
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("anna@example.com", "hunter2"));

        assert!(debug.contains("anna@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let h = Harness::new(backend());
        let auth = h.client.auth();

        let session = auth
            .login(&Credentials::new("anna@example.com", "hunter2"))
            .await
            .unwrap();

        assert_eq!(session.token, "jwt-1");
        assert_eq!(h.client.tokens().token().await.unwrap().as_deref(), Some("jwt-1"));
        assert!(auth.is_authenticated().await.unwrap());

        let login = &h.transport.requests()[0];
        assert!(login.headers.get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_login_without_token_is_rejected() {
        let h = Harness::new(MockTransport::ok(200, json!({"token": " "})));

        let err = h
            .client
            .auth()
            .login(&Credentials::new("anna@example.com", "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
        assert!(!h.client.auth().is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_register_stores_token() {
        let h = Harness::new(backend());
        let request = RegisterRequest {
            email: "anna@example.com".into(),
            password: "hunter2".into(),
            name: "Anna".into(),
            phone: None,
        };

        h.client.auth().register(&request).await.unwrap();

        assert!(h.client.auth().is_authenticated().await.unwrap());
        assert_eq!(h.transport.log(), vec!["POST /auth/register"]);
    }

    #[tokio::test]
    async fn test_profile_without_token_fails_locally() {
        let h = Harness::new(backend());

        let err = h.client.auth().profile().await.unwrap_err();

        assert_eq!(err.to_string(), "Authentication required");
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_auth_lifecycle() {
        let h = Harness::new(backend());
        let auth = h.client.auth();

        auth.login(&Credentials::new("anna@example.com", "hunter2"))
            .await
            .unwrap();
        let profile = auth.profile().await.unwrap();
        assert_eq!(profile.data.name.as_deref(), Some("Anna"));
        assert!(auth.profile().await.unwrap().from_cache);

        auth.logout().await.unwrap();

        assert!(h.client.cache().is_empty());
        assert!(!auth.is_authenticated().await.unwrap());
        let calls = h.transport.calls();
        assert_eq!(auth.profile().await.unwrap_err(), ApiError::AuthRequired);
        assert_eq!(h.transport.calls(), calls);
        assert_eq!(
            h.transport.log(),
            vec!["POST /auth/login", "GET /users/profile", "POST /auth/logout"]
        );
    }

    #[tokio::test]
    async fn test_logout_succeeds_offline() {
        let h = Harness::signed_in(MockTransport::failing(TransportError::Connect(
            "refused".into(),
        )))
        .await;
        h.client.cache().set_default("centers", &json!([])).unwrap();

        h.client.auth().logout().await.unwrap();

        assert_eq!(h.storage.get(AUTH_TOKEN_KEY).await.unwrap(), None);
        assert!(h.client.cache().is_empty());
        assert_eq!(h.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_logout_without_token_skips_backend() {
        let h = Harness::new(backend());

        h.client.auth().logout().await.unwrap();

        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_profile_invalidates_profile() {
        let h = Harness::signed_in(backend()).await;
        h.client.auth().profile().await.unwrap();

        h.client
            .auth()
            .update_profile(&json!({"name": "Anna"}))
            .await
            .unwrap();

        assert!(!h.client.cache().contains_fresh("user_profile"));
        assert!(!h.client.auth().profile().await.unwrap().from_cache);
    }

    #[tokio::test]
    async fn test_login_drops_previous_user_data() {
        let h = Harness::new(backend());
        h.client.cache().set_default("user_profile", &json!({"id": 9})).unwrap();
        h.client.cache().set_default("bookings_my", &json!([])).unwrap();
        h.client.cache().set_default("centers", &json!([])).unwrap();

        h.client
            .auth()
            .login(&Credentials::new("anna@example.com", "hunter2"))
            .await
            .unwrap();

        assert_eq!(h.client.cache().len(), 1);
        assert!(h.client.cache().contains_fresh("centers"));
    }

    #[tokio::test]
    async fn test_logout_with_unreadable_storage_still_clears_cache() {
        let transport = backend();
        let client = client_with(
            Arc::new(BrokenStorage),
            transport.clone(),
            Arc::new(ManualClock::new()),
        );
        client.cache().set_default("user_profile", &json!({"id": 1})).unwrap();
        client.cache().set_default("centers", &json!([])).unwrap();

        let err = client.auth().logout().await.unwrap_err();

        assert!(matches!(err, ApiError::Storage(_)));
        assert!(client.cache().is_empty());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_login_drops_previous_booking_details() {
        let h = Harness::new(MockTransport::new(|request| {
            let body = if request.url.ends_with("/auth/login") {
                json!({"token": "jwt-b"})
            } else {
                json!({"id": 5, "status": "B-visible"})
            };
            Ok(HttpResponse::json(200, &body))
        }));
        h.client
            .cache()
            .set_default("booking_5", &json!({"id": 5, "status": "A-private"}))
            .unwrap();

        h.client
            .auth()
            .login(&Credentials::new("b@example.com", "secret"))
            .await
            .unwrap();
        let booking = h.client.bookings().get("5").await.unwrap();

        assert!(!booking.from_cache);
        assert_eq!(booking.data.status.as_deref(), Some("B-visible"));
    }
}
