//! Articles API endpoints

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

const ENDPOINT: &str = "articles";

/// Articles API interface
#[derive(Debug, Clone)]
pub struct ArticlesApi {
    client: RehabClient,
}

impl ArticlesApi {
    /// Create a new articles API interface
    pub(crate) fn new(client: RehabClient) -> Self {
        Self { client }
    }

    /// List articles
    ///
    /// GET /articles?…
    pub async fn list(&self, filters: &ArticleFilters) -> ApiResult<Fetched<Page<Article>>> {
        let filters = Filters::from_serialize(filters)?;
        self.client
            .read_through(
                &list_key(ENDPOINT, &filters),
                &filters.apply_to(ENDPOINT),
                RequestConfig::get(),
                self.client.config().cache_ttl,
                |envelope: ListEnvelope<Article>| Page::from(envelope),
            )
            .await
    }

    /// Get a single article
    ///
    /// GET /articles/{id}
    pub async fn get(&self, id: &str) -> ApiResult<Fetched<Article>> {
        self.client
            .cached_get(
                &entity_key("article", id),
                &entity_path(ENDPOINT, id),
                RequestConfig::get(),
                DETAIL_TTL,
            )
            .await
    }

    /// Publish an article
    ///
    /// POST /articles
    pub async fn create<B: Serialize + ?Sized>(&self, article: &B) -> ApiResult<Article> {
        self.client
            .mutate(
                ENDPOINT,
                RequestConfig::post().json(article)?,
                Invalidation::family(ENDPOINT),
            )
            .await
    }

    /// Edit an article
    ///
    /// PUT /articles/{id}
    pub async fn update<B: Serialize + ?Sized>(&self, id: &str, article: &B) -> ApiResult<Article> {
        self.client
            .mutate(
                &entity_path(ENDPOINT, id),
                RequestConfig::put().json(article)?,
                Invalidation::family(ENDPOINT).key(entity_key("article", id)),
            )
            .await
    }

    /// Remove an article
    ///
    /// DELETE /articles/{id}
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .mutate::<IgnoredAny>(
                &entity_path(ENDPOINT, id),
                RequestConfig::delete(),
                Invalidation::family(ENDPOINT).key(entity_key("article", id)),
            )
            .await?;
        Ok(())
    }
}

/// Filters for listing articles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFilters {
    /// Category slug
    pub category: Option<String>,
    /// Full-text search
    pub search: Option<String>,
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
}

impl ArticleFilters {
    /// No filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Only articles in `category`
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Full-text search
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Request one page
    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }
}

/// Article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Article ID
    pub id: EntityId,
    /// Headline
    pub title: String,
    /// Teaser text
    #[serde(default)]
    pub summary: Option<String>,
    /// Publication timestamp as sent by the backend
    #[serde(default, rename = "publishedAt")]
    pub published_at: Option<String>,
    /// Every other field the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, MockTransport};
    use serde_json::json;

    fn article(id: u32) -> Value {
        json!({"id": id, "title": "Recovery after stroke", "publishedAt": "2024-03-01", "body": "…"})
    }

    #[test]
    fn test_article_deserialize() {
        let parsed: Article = serde_json::from_value(article(4)).unwrap();

        assert_eq!(parsed.id.as_str(), "4");
        assert_eq!(parsed.published_at.as_deref(), Some("2024-03-01"));
        assert!(parsed.extra.contains_key("body"));
    }

    #[tokio::test]
    async fn test_list_query_and_cache() {
        let h = Harness::new(MockTransport::ok(200, json!([article(1), article(2)])));
        let filters = ArticleFilters::new().with_category("neurology").with_page(1, 20);

        let first = h.client.articles().list(&filters).await.unwrap();
        let second = h.client.articles().list(&filters).await.unwrap();

        assert_eq!(first.data.items.len(), 2);
        assert!(second.from_cache);
        assert_eq!(
            h.transport.log(),
            vec!["GET /articles?category=neurology&limit=20&page=1"]
        );
    }

    #[tokio::test]
    async fn test_get_caches_by_entity_key() {
        let h = Harness::new(MockTransport::ok(200, article(4)));

        h.client.articles().get("4").await.unwrap();

        assert!(h.client.cache().contains_fresh("article_4"));
        assert_eq!(h.transport.log(), vec!["GET /articles/4"]);
    }

    #[tokio::test]
    async fn test_delete_invalidates_lists_and_entity() {
        let h = Harness::signed_in(MockTransport::ok(200, json!({"deleted": true}))).await;
        let cache = h.client.cache();
        cache.set_default("articles?page=1", &json!([])).unwrap();
        cache.set_default("article_4", &article(4)).unwrap();
        cache.set_default("center_4", &json!({})).unwrap();

        h.client.articles().delete("4").await.unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.contains_fresh("center_4"));
    }
}
