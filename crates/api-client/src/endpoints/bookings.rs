//! Bookings API endpoints
//!
//! Every route here belongs to the signed-in user and requires a token.

use crate::client::RehabClient;
use crate::endpoints::SESSION_TTL;
use crate::error::ApiResult;
use crate::executor::RequestConfig;
use crate::invalidation::Invalidation;
use crate::keys::{entity_key, entity_path};
use crate::types::{EntityId, Fetched, ListEnvelope, Page};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ENDPOINT: &str = "bookings";
const MINE_KEY: &str = "bookings_my";

/// Bookings API interface
#[derive(Debug, Clone)]
pub struct BookingsApi {
    client: RehabClient,
}

impl BookingsApi {
    /// Create a new bookings API interface
    pub(crate) fn new(client: RehabClient) -> Self {
        Self { client }
    }

    /// Book a stay at a center
    ///
    /// POST /bookings
    pub async fn create(&self, booking: &NewBooking) -> ApiResult<Booking> {
        self.client
            .mutate(
                ENDPOINT,
                RequestConfig::post().json(booking)?,
                Invalidation::family(ENDPOINT),
            )
            .await
    }

    /// Bookings of the signed-in user
    ///
    /// GET /bookings/my
    pub async fn mine(&self) -> ApiResult<Fetched<Page<Booking>>> {
        self.client
            .read_through(
                MINE_KEY,
                &format!("{ENDPOINT}/my"),
                RequestConfig::get().authenticated(),
                SESSION_TTL,
                |envelope: ListEnvelope<Booking>| Page::from(envelope),
            )
            .await
    }

    /// Get a single booking
    ///
    /// GET /bookings/{id}
    pub async fn get(&self, id: &str) -> ApiResult<Fetched<Booking>> {
        self.client
            .cached_get(
                &entity_key("booking", id),
                &entity_path(ENDPOINT, id),
                RequestConfig::get().authenticated(),
                SESSION_TTL,
            )
            .await
    }

    /// Cancel a booking
    ///
    /// PUT /bookings/{id}/cancel
    pub async fn cancel(&self, id: &str) -> ApiResult<Booking> {
        self.client
            .mutate(
                &format!("{}/cancel", entity_path(ENDPOINT, id)),
                RequestConfig::put(),
                Invalidation::family(ENDPOINT).key(entity_key("booking", id)),
            )
            .await
    }
}

/// New booking request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    /// Center to book
    #[serde(rename = "centerId")]
    pub center_id: EntityId,
    /// Requested check-in date, `YYYY-MM-DD`
    pub date: String,
    /// Free-text notes for the center
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewBooking {
    /// Booking at `center_id` from `date`
    pub fn new(center_id: impl Into<EntityId>, date: impl Into<String>) -> Self {
        Self {
            center_id: center_id.into(),
            date: date.into(),
            notes: None,
        }
    }

    /// Attach notes for the center
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking ID
    pub id: EntityId,
    /// Booked center
    #[serde(default, rename = "centerId")]
    pub center_id: Option<EntityId>,
    /// Check-in date, `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    /// e.g. "pending", "confirmed", "cancelled"
    #[serde(default)]
    pub status: Option<String>,
    /// Every other field the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
