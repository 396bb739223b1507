//! Configuration for the rehab API client
//!
//! Supports environment-based configuration with sensible defaults.

use crate::error::{ApiError, ApiResult};
use rehab_core::cache::DEFAULT_TTL;
use rehab_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

/// Default backend URL (local Express server)
const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Timeout for the reachability probe
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    #[default]
    Production,
}

impl Environment {
    /// Parse from `REHAB_ENV`
    pub fn from_env() -> Self {
        Self::parse(&env::var("REHAB_ENV").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" => Self::Staging,
            _ => Self::Production,
        }
    }

    /// Retry policy suited to the environment
    pub fn retry_policy(self) -> RetryConfig {
        match self {
            Self::Development => RetryConfig::quick(),
            Self::Staging | Self::Production => RetryConfig::default(),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every endpoint is resolved against
    pub base_url: String,
    /// Timeout applied to every data request
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Timeout applied to the reachability probe
    #[serde(with = "duration_secs")]
    pub probe_timeout: Duration,
    /// Default TTL for cached reads
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,
    /// Retry configuration for network-class failures
    pub retry: RetryConfig,
    /// Current environment
    pub environment: Environment,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            cache_ttl: DEFAULT_TTL,
            retry: RetryConfig::default(),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `REHAB_API_URL`: Base URL of the backend
    /// - `REHAB_ENV`: Environment (development/staging/production)
    /// - `REHAB_TIMEOUT_SECS`: Request timeout in seconds
    /// - `REHAB_CACHE_TTL_SECS`: Default cache TTL in seconds
    /// - `REHAB_MAX_RETRIES`: Attempt budget for network failures
    pub fn from_env() -> ApiResult<Self> {
        let environment = Environment::from_env();
        let mut config = Self {
            environment,
            retry: environment.retry_policy(),
            ..Self::default()
        };

        if let Ok(url) = env::var("REHAB_API_URL") {
            config.base_url = url;
        }
        if let Some(secs) = parse_env_u64("REHAB_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env_u64("REHAB_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_env_u64("REHAB_MAX_RETRIES")? {
            let attempts = u32::try_from(attempts).map_err(|_| {
                rehab_core::Error::invalid_config_value("REHAB_MAX_RETRIES", &attempts.to_string())
            })?;
            config.retry = config.retry.with_max_attempts(attempts);
        }

        Ok(config)
    }

    /// Create development configuration
    #[must_use]
    pub fn development() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry: RetryConfig::quick(),
            environment: Environment::Development,
            ..Self::default()
        }
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the probe timeout
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Builder-style method to set the default cache TTL
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::config(format!("base_url is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::config("base_url must start with http:// or https://"));
        }

        if self.timeout.is_zero() || self.probe_timeout.is_zero() {
            return Err(ApiError::config("timeouts cannot be zero"));
        }

        if self.retry.max_attempts == 0 {
            return Err(ApiError::config("retry.max_attempts must be at least 1"));
        }

        Ok(())
    }
}

fn parse_env_u64(name: &str) -> ApiResult<Option<u64>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| {
                rehab_core::Error::invalid_config_value(name, &raw)
                    .with_suggestion("Use a whole number")
                    .into()
            }),
        Err(_) => Ok(None),
    }
}
