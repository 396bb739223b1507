//! In-memory TTL cache for successful read results
//!
//! Entries are stored as JSON values so one cache can hold every resource
//! type; reads deserialize into the caller's type. Staleness is detected
//! lazily: an entry older than its TTL is evicted by the `get` that observes
//! it, and nothing sweeps the map in the background.
//!
//! # Example
//!
//! ```rust
//! use rehab_core::cache::ResponseCache;
//! use rehab_core::clock::SystemClock;
//! use std::sync::Arc;
//!
//! let cache = ResponseCache::new(Arc::new(SystemClock));
//! cache.set_default("centers?city=Moscow", &vec!["Clinic A"]).unwrap();
//!
//! let hit: Option<Vec<String>> = cache.get("centers?city=Moscow");
//! assert_eq!(hit, Some(vec!["Clinic A".to_string()]));
//!
//! cache.invalidate(Some("centers"));
//! assert!(cache.is_empty());
//! ```

use crate::clock::Clock;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// TTL used by [`ResponseCache::set_default`] unless configured otherwise
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached value with its freshness window
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cached payload
    pub data: Value,
    /// When the entry was stored
    pub timestamp: Instant,
    /// How long the entry stays fresh
    pub ttl: Duration,
}

impl CacheEntry {
    /// An entry is fresh iff `now - timestamp < ttl`
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) < self.ttl
    }
}

/// TTL-keyed response cache
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    stale_evictions: AtomicU64,
}

impl ResponseCache {
    /// Create a cache with the default five minute TTL
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_default_ttl(clock, DEFAULT_TTL)
    }

    /// Create a cache with a custom default TTL
    pub fn with_default_ttl(clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale_evictions: AtomicU64::new(0),
        }
    }

    /// Default TTL applied by [`ResponseCache::set_default`]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get a fresh value, evicting the key if it is stale or no longer
    /// decodes as `T`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = self.clock.now();

        let mut entries = self.write();
        let Some(entry) = entries.get(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if !entry.is_fresh(now) {
            entries.remove(key);
            self.stale_evictions.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Evicted stale cache entry");
            return None;
        }

        match <T as serde::Deserialize>::deserialize(&entry.data) {
            Ok(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Err(err) => {
                debug!(key, error = %err, "Cached value has unexpected shape, evicting");
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value, replacing any existing entry for the key
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> Result<()> {
        let data = serde_json::to_value(data).map_err(|e| Error::cache_serialization(key, e))?;
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now(),
            ttl,
        };
        self.write().insert(key.to_string(), entry);
        Ok(())
    }

    /// Store a value with the default TTL
    pub fn set_default<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        self.set(key, data, self.default_ttl)
    }

    /// Remove one exact key
    pub fn remove(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Remove every key containing `pattern`, or everything when `None`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        match pattern {
            Some(pattern) => entries.retain(|key, _| !key.contains(pattern)),
            None => entries.clear(),
        }
        let removed = before - entries.len();
        debug!(pattern = pattern.unwrap_or("*"), removed, "Cache invalidated");
        removed
    }

    /// Remove everything
    pub fn clear(&self) {
        self.invalidate(None);
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a fresh entry exists, without touching statistics
    pub fn contains_fresh(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|entry| entry.is_fresh(now))
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_evictions: self.stale_evictions.load(Ordering::Relaxed),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of stored entries
    pub entries: usize,
    /// Reads served from the cache
    pub hits: u64,
    /// Reads that found nothing usable
    pub misses: u64,
    /// Entries evicted because they were observed stale
    pub stale_evictions: u64,
}
