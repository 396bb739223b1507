//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{ArticlesApi, AuthApi, BookingsApi, CentersApi, HealthApi};
use crate::error::{ApiError, ApiResult};
use crate::executor::{RequestConfig, RequestExecutor};
use crate::invalidation::Invalidation;
use crate::token::AuthTokenStore;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::Fetched;
use rehab_core::cache::ResponseCache;
use rehab_core::clock::{Clock, SystemClock};
use rehab_core::storage::KeyValueStorage;
use rehab_telemetry::metrics;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Metric names reported by the read path
pub mod metric {
    /// Reads served from the response cache
    pub const CACHE_HITS: &str = "cache.hits";
    /// Reads that went to the network
    pub const CACHE_MISSES: &str = "cache.misses";
}

/// Rehab directory API client
///
/// Cheap to clone; clones share the response cache, the token store and the
/// transport.
#[derive(Debug, Clone)]
pub struct RehabClient {
    executor: RequestExecutor,
    cache: Arc<ResponseCache>,
    tokens: AuthTokenStore,
    config: Arc<ClientConfig>,
}

impl RehabClient {
    /// Create a client configured from the environment
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> ApiResult<Self> {
        Self::builder(ClientConfig::from_env()?).storage(storage).build()
    }

    /// Start building a client with explicit collaborators
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            storage: None,
            clock: None,
            transport: None,
        }
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// The shared response cache
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// The token store
    #[must_use]
    pub fn tokens(&self) -> &AuthTokenStore {
        &self.tokens
    }

    // -------------------------------------------------------------------------
    // Facades
    // -------------------------------------------------------------------------

    /// Rehabilitation centers and their reviews
    #[must_use]
    pub fn centers(&self) -> CentersApi {
        CentersApi::new(self.clone())
    }

    /// Articles
    #[must_use]
    pub fn articles(&self) -> ArticlesApi {
        ArticlesApi::new(self.clone())
    }

    /// Login, registration, logout and the user profile
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Bookings of the signed-in user
    #[must_use]
    pub fn bookings(&self) -> BookingsApi {
        BookingsApi::new(self.clone())
    }

    /// Reachability probe
    #[must_use]
    pub fn health(&self) -> HealthApi {
        HealthApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Request plumbing shared by the facades
    // -------------------------------------------------------------------------

    /// Execute a request without touching the cache
    pub async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestConfig,
    ) -> ApiResult<T> {
        self.executor.execute(endpoint, request).await
    }

    /// Serve `key` from the cache, or fetch `endpoint`, convert the body
    /// with `map`, and cache the converted value for `ttl`
    ///
    /// Protected reads are only served while a token is stored, cached or not.
    pub(crate) async fn read_through<R, T, F>(
        &self,
        key: &str,
        endpoint: &str,
        request: RequestConfig,
        ttl: Duration,
        map: F,
    ) -> ApiResult<Fetched<T>>
    where
        R: DeserializeOwned,
        T: Serialize + DeserializeOwned,
        F: FnOnce(R) -> T,
    {
        if request.requires_auth() && !self.tokens.has_token().await? {
            return Err(ApiError::AuthRequired);
        }
        if let Some(data) = self.cache.get::<T>(key) {
            metrics().increment(metric::CACHE_HITS);
            debug!(key, "Served from cache");
            return Ok(Fetched::cached(data));
        }
        metrics().increment(metric::CACHE_MISSES);

        let data = map(self.executor.execute::<R>(endpoint, request).await?);
        if let Err(err) = self.cache.set(key, &data, ttl) {
            warn!(key, error = %err, "Response not cached");
        }
        Ok(Fetched::network(data))
    }

    /// [`RehabClient::read_through`] without conversion
    pub(crate) async fn cached_get<T>(
        &self,
        key: &str,
        endpoint: &str,
        request: RequestConfig,
        ttl: Duration,
    ) -> ApiResult<Fetched<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.read_through(key, endpoint, request, ttl, |data: T| data)
            .await
    }

    /// Run an authenticated mutation and apply `invalidation` before
    /// returning its result
    pub(crate) async fn mutate<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestConfig,
        invalidation: Invalidation,
    ) -> ApiResult<T> {
        let result = self
            .executor
            .execute(endpoint, request.authenticated())
            .await?;
        invalidation.apply(&self.cache);
        Ok(result)
    }
}

/// Builder for [`RehabClient`]
#[must_use]
pub struct ClientBuilder {
    config: ClientConfig,
    storage: Option<Arc<dyn KeyValueStorage>>,
    clock: Option<Arc<dyn Clock>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Storage for the auth token (required)
    pub fn storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Time source for cache freshness (defaults to the system clock)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// HTTP transport (defaults to `reqwest`)
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate the configuration and assemble the client
    pub fn build(self) -> ApiResult<RehabClient> {
        self.config.validate()?;

        let storage = self
            .storage
            .ok_or_else(|| ApiError::config("a key-value storage is required"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new()
                    .map_err(|e| ApiError::config(format!("HTTP client setup failed: {e}")))?,
            ),
        };

        let tokens = AuthTokenStore::new(storage);
        let executor = RequestExecutor::new(transport, tokens.clone(), &self.config);
        let cache = Arc::new(ResponseCache::with_default_ttl(clock, self.config.cache_ttl));

        Ok(RehabClient {
            executor,
            cache,
            tokens,
            config: Arc::new(self.config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, MockTransport};
    use rehab_core::storage::MemoryStorage;
    use serde_json::{json, Value};

    #[test]
    fn test_client_creation() {
        let client = RehabClient::builder(ClientConfig::development())
            .storage(Arc::new(MemoryStorage::new()))
            .build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_storage_is_required() {
        let err = RehabClient::builder(ClientConfig::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = RehabClient::builder(ClientConfig::default().with_base_url("not a url"))
            .storage(Arc::new(MemoryStorage::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[tokio::test]
    async fn test_read_through_caches_network_result() {
        let h = Harness::new(MockTransport::ok(200, json!({"v": 1})));

        let first: Fetched<Value> = h
            .client
            .cached_get("k", "thing", RequestConfig::get(), Duration::from_secs(10))
            .await
            .unwrap();
        let second: Fetched<Value> = h
            .client
            .cached_get("k", "thing", RequestConfig::get(), Duration::from_secs(10))
            .await
            .unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.data, second.data);
        assert_eq!(h.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_read_is_not_cached() {
        let h = Harness::new(MockTransport::ok(500, json!({"error": "boom"})));

        let result: ApiResult<Fetched<Value>> = h
            .client
            .cached_get("k", "thing", RequestConfig::get(), Duration::from_secs(10))
            .await;

        assert!(result.is_err());
        assert!(h.client.cache().is_empty());
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let h = Harness::signed_in(MockTransport::ok(422, json!({"error": "invalid"}))).await;
        h.client.cache().set_default("centers", &1).unwrap();

        let result: ApiResult<Value> = h
            .client
            .mutate("centers", RequestConfig::post(), Invalidation::family("centers"))
            .await;

        assert!(result.unwrap_err().is_validation());
        assert!(h.client.cache().contains_fresh("centers"));
    }

    #[tokio::test]
    async fn test_protected_cache_entry_needs_a_token() {
        let h = Harness::new(MockTransport::ok(200, json!({"v": 1})));
        h.client.cache().set_default("user_profile", &json!({"v": 0})).unwrap();

        let result: ApiResult<Fetched<Value>> = h
            .client
            .cached_get(
                "user_profile",
                "users/profile",
                RequestConfig::get().authenticated(),
                Duration::from_secs(60),
            )
            .await;

        assert_eq!(result.unwrap_err(), ApiError::AuthRequired);
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_cache() {
        let h = Harness::new(MockTransport::ok(200, json!(null)));
        let clone = h.client.clone();

        clone.cache().set_default("articles", &1).unwrap();
        assert!(h.client.cache().contains_fresh("articles"));
    }
}
