//! Bearer token lifecycle
//!
//! The token is written on a successful login or registration, read before
//! every protected request, and deleted on logout or when the backend
//! answers 401. Nothing else in the crate holds on to it.

use crate::error::ApiResult;
use rehab_core::storage::KeyValueStorage;
use std::sync::Arc;
use tracing::debug;

/// Storage key of the bearer token
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Persists the bearer token through an injected storage capability
#[derive(Debug, Clone)]
pub struct AuthTokenStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl AuthTokenStore {
    /// Create a store over the given storage
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Current token; an empty stored value counts as no token
    pub async fn token(&self) -> ApiResult<Option<String>> {
        let token = self.storage.get(AUTH_TOKEN_KEY).await?;
        Ok(token.filter(|t| !t.trim().is_empty()))
    }

    /// Whether a token is stored
    pub async fn has_token(&self) -> ApiResult<bool> {
        Ok(self.token().await?.is_some())
    }

    /// Persist a new token, replacing the previous one
    pub async fn store(&self, token: &str) -> ApiResult<()> {
        self.storage.set(AUTH_TOKEN_KEY, token).await?;
        debug!("Auth token stored");
        Ok(())
    }

    /// Delete the token
    pub async fn clear(&self) -> ApiResult<()> {
        self.storage.remove(AUTH_TOKEN_KEY).await?;
        debug!("Auth token cleared");
        Ok(())
    }
}
