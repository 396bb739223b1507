//! Test doubles shared by the unit tests

use crate::client::RehabClient;
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use rehab_core::clock::ManualClock;
use rehab_core::retry::RetryConfig;
use rehab_core::error::{Error, Result as StorageResult};
use rehab_core::storage::{KeyValueStorage, MemoryStorage};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const BASE_URL: &str = "http://backend.test/api";

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// In-process transport that records every request it is asked to send
pub(crate) struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("calls", &self.calls())
            .finish()
    }
}

impl MockTransport {
    pub(crate) fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answer with the same status and JSON body
    pub(crate) fn ok(status: u16, body: Value) -> Arc<Self> {
        Self::new(move |_| Ok(HttpResponse::json(status, &body)))
    }

    /// Always fail before a response arrives
    pub(crate) fn failing(error: TransportError) -> Arc<Self> {
        Self::new(move |_| Err(error.clone()))
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().map_or(0, |r| r.len())
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// `"METHOD /path?query"` of every request, relative to the base URL
    pub(crate) fn log(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url.trim_start_matches(BASE_URL)))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = (self.handler)(&request);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        response
    }
}

/// Retry policy with the default budget and no waiting
pub(crate) fn instant_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    }
}

/// Storage whose every operation fails as if its file were corrupted
#[derive(Debug, Default)]
pub(crate) struct BrokenStorage;

#[async_trait]
impl KeyValueStorage for BrokenStorage {
    async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(Error::storage_corrupted("session.json"))
    }

    async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(Error::storage_corrupted("session.json"))
    }

    async fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(Error::storage_corrupted("session.json"))
    }
}

/// Client on the test base URL with the given storage and transport
pub(crate) fn client_with(
    storage: Arc<dyn KeyValueStorage>,
    transport: Arc<MockTransport>,
    clock: Arc<ManualClock>,
) -> RehabClient {
    let config = ClientConfig::default()
        .with_base_url(BASE_URL)
        .with_retry(instant_retry());

    RehabClient::builder(config)
        .storage(storage)
        .clock(clock)
        .transport(transport)
        .build()
        .expect("valid test configuration")
}

/// Everything a facade test needs to drive and observe the client
pub(crate) struct Harness {
    pub client: RehabClient,
    pub transport: Arc<MockTransport>,
    pub clock: Arc<ManualClock>,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    pub(crate) fn new(transport: Arc<MockTransport>) -> Self {
        let clock = Arc::new(ManualClock::new());
        let storage = Arc::new(MemoryStorage::new());
        let client = client_with(storage.clone(), transport.clone(), clock.clone());

        Self {
            client,
            transport,
            clock,
            storage,
        }
    }

    /// Harness with a token already stored
    pub(crate) async fn signed_in(transport: Arc<MockTransport>) -> Self {
        let harness = Self::new(transport);
        harness
            .client
            .tokens()
            .store("test-token")
            .await
            .expect("memory storage never fails");
        harness
    }
}
