//! Request execution with auth, classification and bounded retries
//!
//! One call to [`RequestExecutor::execute`] is one logical request:
//!
//! 1. Resolve the endpoint against the base URL
//! 2. Attach the bearer token when the request requires auth, or fail with
//!    [`ApiError::AuthRequired`] without touching the network
//! 3. Send through the [`Transport`], retrying only network-class failures
//! 4. Turn the response into `T`, an [`ApiError::Http`] or an
//!    [`ApiError::Decode`], evicting the token on 401
//!
//! The executor never reads or writes the response cache.

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, TransportError};
use crate::token::AuthTokenStore;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use rehab_core::retry::{retry_async, RetryConfig};
use rehab_telemetry::{metrics, Timer};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "x-request-id";

/// Metric names reported by the executor
pub mod metric {
    /// Every transport send, retries included
    pub const REQUESTS: &str = "api.requests";
    /// Sends after the first attempt
    pub const RETRIES: &str = "api.retries";
    /// Logical requests that ended in an error
    pub const FAILURES: &str = "api.failures";
    /// Wall time of a logical request in milliseconds
    pub const LATENCY: &str = "api.request_ms";
}

/// Per-call request description
#[derive(Debug, Clone)]
pub struct RequestConfig {
    method: Method,
    headers: HeaderMap,
    body: Option<Value>,
    require_auth: bool,
    timeout: Option<Duration>,
    retry: Option<RetryConfig>,
}

impl RequestConfig {
    /// Request with the given method, no body, no auth
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
            require_auth: false,
            timeout: None,
            retry: None,
        }
    }

    /// GET request
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// POST request
    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// PUT request
    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    /// DELETE request
    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = Some(serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?);
        Ok(self)
    }

    /// Require a stored bearer token
    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.require_auth = true;
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Override the client-wide timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the client-wide retry policy
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Whether a stored token is required
    pub fn requires_auth(&self) -> bool {
        self.require_auth
    }
}

/// Sends logical requests on behalf of the facades
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    tokens: AuthTokenStore,
    base_url: Arc<str>,
    timeout: Duration,
    retry: RetryConfig,
}

impl RequestExecutor {
    /// Create an executor from a validated configuration
    pub fn new(transport: Arc<dyn Transport>, tokens: AuthTokenStore, config: &ClientConfig) -> Self {
        Self {
            transport,
            tokens,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            timeout: config.timeout,
            retry: config.retry.clone(),
        }
    }

    /// Absolute URL of an endpoint
    pub fn url_for(&self, endpoint: &str) -> ApiResult<String> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        Url::parse(&url).map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;
        Ok(url)
    }

    /// Execute one logical request and decode the body as `T`
    #[instrument(
        skip(self, config),
        fields(method = %config.method, require_auth = config.require_auth)
    )]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        config: RequestConfig,
    ) -> ApiResult<T> {
        let url = self.url_for(endpoint)?;
        let request_id = Uuid::new_v4().to_string();

        let mut headers = config.headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(X_REQUEST_ID, value);
        }

        if config.require_auth {
            let Some(token) = self.tokens.token().await? else {
                debug!(endpoint, "No stored token, rejecting protected request locally");
                return Err(ApiError::AuthRequired);
            };
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ApiError::Storage("stored auth token is not a valid header value".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let request = HttpRequest {
            method: config.method,
            url,
            headers,
            body: config.body,
            timeout: config.timeout.unwrap_or(self.timeout),
        };
        let retry = config.retry.as_ref().unwrap_or(&self.retry);

        let result = match self.send(&request_id, &request, retry).await {
            Ok(response) => self.handle_response(&request_id, response).await,
            Err(err) => Err(err),
        };
        if result.is_err() {
            metrics().increment(metric::FAILURES);
        }
        result
    }

    /// Send with retries on network-class failures only
    async fn send(
        &self,
        request_id: &str,
        request: &HttpRequest,
        retry: &RetryConfig,
    ) -> ApiResult<HttpResponse> {
        let timer = Timer::start(metric::LATENCY);

        let outcome = retry_async(retry, TransportError::is_retryable, |attempt| {
            let request = request.clone();
            async move {
                metrics().increment(metric::REQUESTS);
                if attempt > 0 {
                    metrics().increment(metric::RETRIES);
                }
                let result = self.transport.send(request).await;
                if let Err(ref err) = result {
                    debug!(request_id, attempt = attempt + 1, error = %err, "Transport failure");
                }
                result
            }
        })
        .await;

        let elapsed = timer.stop();
        match outcome {
            Ok(done) => {
                debug!(
                    request_id,
                    status = done.value.status,
                    attempts = done.attempts,
                    elapsed_ms = elapsed.as_millis(),
                    "Response received"
                );
                Ok(done.value)
            }
            Err(failure) if !failure.error.is_retryable() => {
                warn!(request_id, url = %request.url, error = %failure.error, "Request not sent");
                Err(ApiError::InvalidRequest(failure.error.to_string()))
            }
            Err(failure) => {
                warn!(
                    request_id,
                    url = %request.url,
                    attempts = failure.attempts,
                    error = %failure.error,
                    "Backend unreachable"
                );
                Err(ApiError::Network {
                    attempts: failure.attempts,
                    source: failure.error,
                })
            }
        }
    }

    /// Classify a completed exchange
    async fn handle_response<T: DeserializeOwned>(
        &self,
        request_id: &str,
        response: HttpResponse,
    ) -> ApiResult<T> {
        if response.is_success() {
            return decode_body(&response.body);
        }

        if response.status == StatusCode::UNAUTHORIZED.as_u16() {
            warn!(request_id, "Session rejected by backend, clearing stored token");
            if let Err(err) = self.tokens.clear().await {
                warn!(request_id, error = %err, "Failed to clear auth token");
            }
        }

        let message = error_message(&response);
        debug!(request_id, status = response.status, message = %message, "Request rejected");
        Err(ApiError::http(response.status, message))
    }
}

/// Decode a 2xx body; an empty body decodes as JSON `null`
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    let decoded = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(body)
    };
    decoded.map_err(|e| ApiError::Decode(e.to_string()))
}

/// Best human-readable message of an error response
fn error_message(response: &HttpResponse) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&response.body) {
        for field in ["error", "message"] {
            if let Some(Value::String(message)) = map.get(field) {
                return message.clone();
            }
        }
    }

    let text = String::from_utf8_lossy(&response.body).trim().to_string();
    if !text.is_empty() {
        return text;
    }

    StatusCode::from_u16(response.status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}
