//! Data-access layer for the rehab directory backend
//!
//! Every screen of the app talks to the REST backend through this crate.
//!
//! # Features
//!
//! - **Response cache**: reads are served from an in-memory TTL cache keyed by
//!   canonical filters, and mutations invalidate what they make stale
//! - **Session handling**: the bearer token is persisted through an injected
//!   key-value storage, attached to protected calls and evicted on 401
//! - **Bounded retries**: only network-class failures are retried, with
//!   exponential backoff; exhaustion reports the backend as unreachable
//! - **Request correlation**: every request carries a unique `x-request-id`
//!
//! # Example
//!
//! ```rust,no_run
//! use rehab_api_client::{ClientConfig, RehabClient};
//! use rehab_api_client::endpoints::centers::CenterFilters;
//! use rehab_core::storage::MemoryStorage;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RehabClient::builder(ClientConfig::from_env()?)
//!         .storage(Arc::new(MemoryStorage::new()))
//!         .build()?;
//!
//!     let centers = client
//!         .centers()
//!         .list(&CenterFilters::new().with_city("Kazan"))
//!         .await?;
//!     println!("{} centers (cached: {})", centers.data.items.len(), centers.from_cache);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod executor;
pub mod invalidation;
pub mod keys;
pub mod token;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientBuilder, RehabClient};
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ApiResponse, ApiResult, TransportError};
pub use executor::RequestConfig;
pub use types::{EntityId, Fetched, Page, Pagination};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::RehabClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::articles::{Article, ArticleFilters};
    pub use crate::endpoints::auth::{AuthSession, Credentials, RegisterRequest, User};
    pub use crate::endpoints::bookings::{Booking, NewBooking};
    pub use crate::endpoints::centers::{Center, CenterFilters, NewReview, Review};
    pub use crate::endpoints::health::HealthStatus;
    pub use crate::endpoints::{ArticlesApi, AuthApi, BookingsApi, CentersApi, HealthApi};
    pub use crate::error::{ApiError, ApiResponse, ApiResult};
    pub use crate::types::{EntityId, Fetched, Page};
}
