//! Command implementations

pub mod articles;
pub mod bookings;
pub mod centers;
pub mod health;
pub mod session;

use crate::output::Format;
use rehab_api_client::{ApiError, ClientConfig, RehabClient};
use rehab_core::storage::FileStorage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Connection settings taken from the command line
pub struct Connection {
    pub api_url: Option<String>,
    pub session: Option<PathBuf>,
    pub retries: Option<u32>,
    pub timeout: Option<u64>,
}

impl Connection {
    /// Build the client: environment configuration, overridden by flags
    pub fn open(self, format: Format) -> Result<Context, ApiError> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = self.api_url {
            config = config.with_base_url(url);
        }
        if let Some(attempts) = self.retries {
            let retry = config.retry.clone().with_max_attempts(attempts);
            config = config.with_retry(retry);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        let storage = match self.session {
            Some(path) => FileStorage::new(path),
            None => FileStorage::default_location()?,
        };
        debug!(base_url = %config.base_url, session = %storage.path().display(), "Opening client");

        let client = RehabClient::builder(config)
            .storage(Arc::new(storage))
            .build()?;
        Ok(Context { client, format })
    }
}

/// Everything a command needs
pub struct Context {
    pub client: RehabClient,
    pub format: Format,
}
