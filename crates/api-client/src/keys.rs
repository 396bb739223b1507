//! Canonical cache keys and query strings
//!
//! Filter parameters are flattened into a sorted map before they are turned
//! into either a cache key or a query string, so two filter sets with the
//! same entries always produce the same key no matter how they were built.

use crate::error::{ApiError, ApiResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Sorted, flattened filter parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(BTreeMap<String, String>);

impl Filters {
    /// No filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a serializable filter struct or map.
    ///
    /// Top-level `null`s and empty strings are dropped; nested arrays and
    /// objects are kept as compact JSON.
    pub fn from_serialize<T: Serialize>(params: &T) -> ApiResult<Self> {
        let value =
            serde_json::to_value(params).map_err(|e| ApiError::Encode(e.to_string()))?;
        let mut filters = Self::new();
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    filters.insert_value(key, value);
                }
            }
            Value::Null => {}
            other => {
                return Err(ApiError::Encode(format!(
                    "filters must serialize to an object, got {other}"
                )));
            }
        }
        Ok(filters)
    }

    /// Add a filter, skipping empty values
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert_value(key.into(), Value::String(value.to_string()));
        self
    }

    fn insert_value(&mut self, key: String, value: Value) {
        let rendered = match value {
            Value::Null => return,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            nested => nested.to_string(),
        };
        if !rendered.is_empty() {
            self.0.insert(key, rendered);
        }
    }

    /// Whether no filters are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Form-encoded query string in key order
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    /// Append the query string to an endpoint
    pub fn apply_to(&self, endpoint: &str) -> String {
        if self.is_empty() {
            endpoint.to_string()
        } else {
            format!("{endpoint}?{}", self.query_string())
        }
    }
}

/// Cache key for a list endpoint with filters, e.g. `centers?city=Moscow`
pub fn list_key(endpoint: &str, filters: &Filters) -> String {
    filters.apply_to(endpoint.trim_start_matches('/'))
}

/// Cache key for one entity, e.g. `center_12`
///
/// The id is percent-encoded like its path segment.
pub fn entity_key(kind: &str, id: impl fmt::Display) -> String {
    format!("{kind}_{}", path_segment(&id.to_string()))
}

/// Path of one entity below a collection endpoint, e.g. `centers/12`
pub fn entity_path(endpoint: &str, id: &str) -> String {
    format!("{endpoint}/{}", path_segment(id))
}

/// Percent-encode `raw` so it stays a single path segment
fn path_segment(raw: &str) -> String {
    // byte_serialize writes spaces as '+' and escapes a literal '+'
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
