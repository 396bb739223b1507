//! Endpoint-specific API implementations
//!
//! Each module provides a typed facade over one resource family. Reads go
//! through the response cache, writes require a token and invalidate what
//! they make stale before returning.
//!
//! ## Mapping to the backend
//!
//! | Module | Routes | Cache keys |
//! |--------|--------|------------|
//! | `centers` | `/centers`, `/centers/{id}`, `/centers/{id}/reviews` | `centers?…`, `center_<id>`, `center_<id>_reviews` |
//! | `articles` | `/articles`, `/articles/{id}` | `articles?…`, `article_<id>` |
//! | `auth` | `/auth/login`, `/auth/register`, `/auth/logout`, `/users/profile` | `user_profile` |
//! | `bookings` | `/bookings`, `/bookings/my`, `/bookings/{id}`, `/bookings/{id}/cancel` | `bookings_my`, `booking_<id>` |
//! | `health` | `/health` | never cached |

pub mod articles;
pub mod auth;
pub mod bookings;
pub mod centers;
pub mod health;

pub use articles::ArticlesApi;
pub use auth::AuthApi;
pub use bookings::BookingsApi;
pub use centers::CentersApi;
pub use health::HealthApi;

use std::time::Duration;

/// TTL of single-entity reads
pub const DETAIL_TTL: Duration = Duration::from_secs(10 * 60);

/// TTL of per-user reads (profile, bookings)
pub const SESSION_TTL: Duration = Duration::from_secs(60);
