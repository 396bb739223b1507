//! Shared response shapes

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Backend entity identifier
///
/// The backend sends ids as strings or numbers; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// The ID as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Number(number) => Self(number.to_string()),
        })
    }
}

/// A read result and where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetched<T> {
    /// The payload
    pub data: T,
    /// `true` when served from the response cache without network I/O
    pub from_cache: bool,
}

impl<T> Fetched<T> {
    pub(crate) fn network(data: T) -> Self {
        Self {
            data,
            from_cache: false,
        }
    }

    pub(crate) fn cached(data: T) -> Self {
        Self {
            data,
            from_cache: true,
        }
    }

    /// Drop the provenance
    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Pagination block of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Items across all pages
    pub total: u64,
    /// Number of pages
    pub pages: u32,
}

impl Pagination {
    /// Pagination describing a single page holding `count` items
    pub fn single(count: usize) -> Self {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        Self {
            page: 1,
            limit: count,
            total: u64::from(count),
            pages: 1,
        }
    }
}

/// Normalized list result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items of this page
    pub items: Vec<T>,
    /// Where this page sits in the result
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Whether another page follows this one
    pub fn has_more(&self) -> bool {
        self.pagination.page < self.pagination.pages
    }
}

/// List body as sent by the backend: the paginated envelope, or a bare array
/// from endpoints that do not paginate
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope<T> {
    Paginated {
        items: Vec<T>,
        pagination: Option<Pagination>,
    },
    Bare(Vec<T>),
}

impl<T> From<ListEnvelope<T>> for Page<T> {
    fn from(envelope: ListEnvelope<T>) -> Self {
        match envelope {
            ListEnvelope::Paginated { items, pagination } => {
                let pagination = pagination.unwrap_or_else(|| Pagination::single(items.len()));
                Self { items, pagination }
            }
            ListEnvelope::Bare(items) => Self {
                pagination: Pagination::single(items.len()),
                items,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_id_accepts_numbers_and_strings() {
        let ids: Vec<EntityId> = serde_json::from_value(json!([7, "c-9"])).unwrap();
        assert_eq!(ids[0].as_str(), "7");
        assert_eq!(ids[1].to_string(), "c-9");
        assert_eq!(serde_json::to_value(&ids[0]).unwrap(), json!("7"));
    }

    #[test]
    fn test_paginated_envelope() {
        let envelope: ListEnvelope<u32> = serde_json::from_value(json!({
            "items": [1, 2],
            "pagination": {"page": 1, "limit": 2, "total": 5, "pages": 3}
        }))
        .unwrap();

        let page = Page::from(envelope);
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.pagination.total, 5);
        assert!(page.has_more());
    }

    #[test]
    fn test_bare_array_is_one_page() {
        let envelope: ListEnvelope<u32> = serde_json::from_value(json!([4, 5, 6])).unwrap();

        let page = Page::from(envelope);
        assert_eq!(page.pagination, Pagination::single(3));
        assert!(!page.has_more());
    }

    #[test]
    fn test_unrelated_shape_is_rejected() {
        let parsed = serde_json::from_value::<ListEnvelope<u32>>(json!({"rows": []}));
        assert!(parsed.is_err());
    }
}
