//! Rehabilitation centers API endpoints
//!
//! - List centers with filters and pagination
//! - Get a single center by ID
//! - Create, update and delete centers
//! - Read and post reviews of a center

use crate::client::RehabClient;
use crate::endpoints::DETAIL_TTL;
use crate::error::ApiResult;
use crate::executor::RequestConfig;
use crate::invalidation::Invalidation;
use crate::keys::{entity_key, entity_path, list_key, Filters};
use crate::types::{EntityId, Fetched, ListEnvelope, Page};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ENDPOINT: &str = "centers";
const FAMILY: &str = "centers";

/// Centers API interface
#[derive(Debug, Clone)]
pub struct CentersApi {
    client: RehabClient,
}

impl CentersApi {
    /// Create a new centers API interface
    pub(crate) fn new(client: RehabClient) -> Self {
        Self { client }
    }

    /// List centers matching `filters`
    ///
    /// GET /centers?…
    pub async fn list(&self, filters: &CenterFilters) -> ApiResult<Fetched<Page<Center>>> {
        let filters = Filters::from_serialize(filters)?;
        self.client
            .read_through(
                &list_key(ENDPOINT, &filters),
                &filters.apply_to(ENDPOINT),
                RequestConfig::get(),
                self.client.config().cache_ttl,
                |envelope: ListEnvelope<Center>| Page::from(envelope),
            )
            .await
    }

    /// Get a single center
    ///
    /// GET /centers/{id}
    pub async fn get(&self, id: &str) -> ApiResult<Fetched<Center>> {
        self.client
            .cached_get(
                &center_key(id),
                &entity_path(ENDPOINT, id),
                RequestConfig::get(),
                DETAIL_TTL,
            )
            .await
    }

    /// Create a center
    ///
    /// POST /centers
    pub async fn create<B: Serialize + ?Sized>(&self, center: &B) -> ApiResult<Center> {
        self.client
            .mutate(
                ENDPOINT,
                RequestConfig::post().json(center)?,
                Invalidation::family(FAMILY),
            )
            .await
    }

    /// Update a center
    ///
    /// PUT /centers/{id}
    pub async fn update<B: Serialize + ?Sized>(&self, id: &str, center: &B) -> ApiResult<Center> {
        self.client
            .mutate(
                &entity_path(ENDPOINT, id),
                RequestConfig::put().json(center)?,
                Invalidation::family(FAMILY).key(center_key(id)),
            )
            .await
    }

    /// Delete a center
    ///
    /// DELETE /centers/{id}
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .mutate::<IgnoredAny>(
                &entity_path(ENDPOINT, id),
                RequestConfig::delete(),
                Invalidation::family(FAMILY)
                    .key(center_key(id))
                    .key(reviews_key(id)),
            )
            .await?;
        Ok(())
    }

    /// Reviews of a center
    ///
    /// GET /centers/{id}/reviews
    pub async fn reviews(&self, id: &str) -> ApiResult<Fetched<Page<Review>>> {
        self.client
            .read_through(
                &reviews_key(id),
                &format!("{}/reviews", entity_path(ENDPOINT, id)),
                RequestConfig::get(),
                DETAIL_TTL,
                |envelope: ListEnvelope<Review>| Page::from(envelope),
            )
            .await
    }

    /// Post a review; the center's rating changes with it
    ///
    /// POST /centers/{id}/reviews
    pub async fn add_review(&self, id: &str, review: &NewReview) -> ApiResult<Review> {
        self.client
            .mutate(
                &format!("{}/reviews", entity_path(ENDPOINT, id)),
                RequestConfig::post().json(review)?,
                Invalidation::family(FAMILY)
                    .key(center_key(id))
                    .key(reviews_key(id)),
            )
            .await
    }
}

fn center_key(id: &str) -> String {
    entity_key("center", id)
}

fn reviews_key(id: &str) -> String {
    format!("{}_reviews", center_key(id))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Filters for listing centers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterFilters {
    /// City name
    pub city: Option<String>,
    /// Center type, e.g. "inpatient"
    #[serde(rename = "type")]
    pub center_type: Option<String>,
    /// Free-text search
    pub search: Option<String>,
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
}

impl CenterFilters {
    /// Create empty filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by city
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Filter by center type
    pub fn with_type(mut self, center_type: impl Into<String>) -> Self {
        self.center_type = Some(center_type.into());
        self
    }

    /// Full-text search
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Select a page
    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }
}

/// Rehabilitation center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    /// Backend ID
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// City the center is in
    #[serde(default)]
    pub city: Option<String>,
    /// Kind of center, e.g. "inpatient"
    #[serde(default, rename = "type")]
    pub center_type: Option<String>,
    /// Average review rating
    #[serde(default)]
    pub rating: Option<f64>,
    /// Every other field the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Review of a center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Backend ID
    pub id: EntityId,
    /// 1 to 5
    pub rating: u8,
    /// Review text
    #[serde(default)]
    pub comment: Option<String>,
    /// Every other field the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// New review request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    /// 1 to 5
    pub rating: u8,
    /// Review text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
