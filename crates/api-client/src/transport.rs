//! HTTP transport boundary
//!
//! A [`Transport`] performs exactly one HTTP exchange. It reports only
//! whether the exchange completed: any status code, 4xx and 5xx included, is
//! a completed exchange and comes back as an [`HttpResponse`]. Failures where
//! no response arrived are classified here, once, into [`TransportError`].

use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// One outgoing HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// JSON body
    pub body: Option<Value>,
    /// Upper bound for the whole exchange
    pub timeout: Duration,
}

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response with a JSON body
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single HTTP request
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Perform the exchange
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Create a transport with the crate's user agent
    pub fn new() -> Result<Self, TransportError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("rehab-api-client/", env!("CARGO_PKG_VERSION"))),
        );

        let inner = Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { inner })
    }

    /// Wrap an existing `reqwest` client
    pub fn with_client(inner: Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout;
        let mut builder = self
            .inner
            .request(request.method, &request.url)
            .headers(request.headers)
            .timeout(timeout);

        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| classify(&e, timeout))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| classify(&e, timeout))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Map a `reqwest` failure onto the transport taxonomy
fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_builder() {
        TransportError::Request(err.to_string())
    } else if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(method: Method, url: String) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_success_response_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/centers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(request(Method::GET, format!("{}/api/centers", server.uri())))
            .await
            .unwrap();

        assert!(response.is_success());
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body, json!({"items": []}));
    }

    #[tokio::test]
    async fn test_error_status_is_a_completed_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Not found"})))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(request(Method::GET, format!("{}/api/centers/9", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_headers_and_body_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/bookings"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({"centerId": 1})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request(Method::POST, format!("{}/api/bookings", server.uri()));
        req.headers
            .insert("authorization", HeaderValue::from_static("Bearer tok"));
        req.body = Some(json!({"centerId": 1}));

        let response = ReqwestTransport::new().unwrap().send(req).await.unwrap();
        assert_eq!(response.status, 201);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_slow_response_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let mut req = request(Method::GET, format!("{}/api/health", server.uri()));
        req.timeout = Duration::from_millis(50);

        let err = ReqwestTransport::new().unwrap().send(req).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout(Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_connect_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = ReqwestTransport::new()
            .unwrap()
            .send(request(Method::GET, format!("http://{addr}/api/health")))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Connect(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unbuildable_request_is_not_sent() {
        let err = ReqwestTransport::new()
            .unwrap()
            .send(request(Method::GET, "not a url".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Request(_)), "got {err:?}");
        assert!(!err.is_retryable());
    }
}
