//! Reachability probe

use crate::client::RehabClient;
use crate::error::ApiResult;
use crate::executor::RequestConfig;
use rehab_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

/// Health check API interface
#[derive(Debug, Clone)]
pub struct HealthApi {
    client: RehabClient,
}

impl HealthApi {
    /// Create a new health API interface
    pub(crate) fn new(client: RehabClient) -> Self {
        Self { client }
    }

    fn request(&self) -> RequestConfig {
        RequestConfig::get()
            .timeout(self.client.config().probe_timeout)
            .retry(RetryConfig::no_retry())
    }

    /// Ask the backend for its health, one attempt under the probe timeout
    ///
    /// GET /health
    pub async fn check(&self) -> ApiResult<HealthStatus> {
        self.client.execute("health", self.request()).await
    }

    /// Check health with timing information
    pub async fn check_timed(&self) -> ApiResult<(HealthStatus, Duration)> {
        let start = Instant::now();
        let status = self.check().await?;
        Ok((status, start.elapsed()))
    }

    /// Whether the backend answers at all; an error status still counts
    pub async fn is_reachable(&self) -> bool {
        match self.check().await {
            Ok(_) => true,
            Err(err) => !err.is_offline(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// e.g. "ok"
    #[serde(default)]
    pub status: Option<String>,
    /// Every other field the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
