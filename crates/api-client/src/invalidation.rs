//! Cache invalidation after mutations
//!
//! A mutating facade call describes what it makes stale (resource-family
//! patterns plus exact entity keys) and the client applies it after the
//! backend accepted the mutation and before the result is handed back.

use rehab_core::cache::ResponseCache;
use tracing::debug;

/// Cache entries made stale by one mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    patterns: Vec<String>,
    keys: Vec<String>,
}

impl Invalidation {
    /// Everything whose key contains `pattern`, e.g. all `centers?…` lists
    pub fn family(pattern: impl Into<String>) -> Self {
        Self::default().pattern(pattern)
    }

    /// Add a substring pattern
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Add an exact key
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Remove the described entries; returns how many were removed
    pub fn apply(&self, cache: &ResponseCache) -> usize {
        let by_pattern: usize = self
            .patterns
            .iter()
            .map(|pattern| cache.invalidate(Some(pattern)))
            .sum();
        let by_key = self.keys.iter().filter(|key| cache.remove(key)).count();

        debug!(
            patterns = ?self.patterns,
            keys = ?self.keys,
            removed = by_pattern + by_key,
            "Applied invalidation"
        );
        by_pattern + by_key
    }
}
