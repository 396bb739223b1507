//! Core building blocks for the rehab directory client
//!
//! This crate provides the pieces the data-access layer is assembled from:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Clock**: Injectable time source so cache expiry is testable
//! - **Retry**: Exponential backoff with a bounded attempt budget
//! - **Cache**: In-memory TTL response cache with pattern invalidation
//! - **Storage**: Key-value capability used to persist the auth token
//!
//! # Example
//!
//! ```rust
//! use rehab_core::{cache::ResponseCache, clock::ManualClock};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = Arc::new(ManualClock::new());
//! let cache = ResponseCache::new(clock.clone());
//!
//! cache.set("center_1", &"Sunrise Clinic", Duration::from_secs(60)).unwrap();
//! clock.advance(Duration::from_secs(60));
//! assert_eq!(cache.get::<String>("center_1"), None);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod clock;
pub mod error;
pub mod retry;
pub mod storage;

pub use error::{Error, ErrorCode, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{CacheStats, ResponseCache, DEFAULT_TTL};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::error::{Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::{retry_async, RetryConfig};
    pub use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};
}
