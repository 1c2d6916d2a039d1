//! Bounded LRU cache for resolved availability statuses.
//!
//! A cached `None` is a confirmed negative lookup and counts as a hit.
//! The cache never fetches on behalf of the caller.

use crate::error::{CompatError, Result};
use crate::types::AvailabilityStatus;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default capacity of the resolver's whole-feature cache
pub const DEFAULT_FEATURE_CACHE_CAPACITY: usize = 1_000;

/// Default capacity of the provider's raw data cache
pub const DEFAULT_DATA_CACHE_CAPACITY: usize = 5_000;

/// Cached lookup outcome: `None` marks a key known to have no data
pub type CachedStatus = Option<Arc<AvailabilityStatus>>;

/// Hit/miss accounting snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
}

struct Inner {
    entries: lru::LruCache<String, CachedStatus>,
    hits: u64,
    misses: u64,
}

/// Fixed-capacity key -> status map ordered by recency of access.
///
/// Every operation holds the instance's mutex, so promote-on-read and
/// evict-on-write are atomic with respect to other workers.
pub struct AvailabilityCache {
    inner: Mutex<Inner>,
}

impl AvailabilityCache {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| CompatError::configuration("cache capacity must be greater than 0"))?;

        Ok(Self {
            inner: Mutex::new(Inner {
                entries: lru::LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, promoting it to most-recently-used on a hit.
    ///
    /// Returns `None` on a miss and `Some(cached)` on a hit, where `cached`
    /// may itself be `None` for a negative entry.
    pub fn get(&self, key: &str) -> Option<CachedStatus> {
        let mut inner = self.lock();
        match inner.entries.get(key).cloned() {
            Some(cached) => {
                inner.hits += 1;
                Some(cached)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert or replace `key`. A new key at capacity evicts the least-recently-used entry.
    pub fn set(&self, key: &str, status: CachedStatus) {
        let mut inner = self.lock();
        if let Some((evicted, _)) = inner.entries.push(key.to_string(), status) {
            if evicted != key {
                tracing::trace!("cache evicted {}", evicted);
            }
        }
    }

    /// Whether `key` is present. Does not touch recency or counters.
    pub fn has(&self, key: &str) -> bool {
        self.lock().entries.contains(key)
    }

    /// Drop all entries and reset counters
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().entries.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let lookups = inner.hits + inner.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            inner.hits as f64 / lookups as f64
        };
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
            size: inner.entries.len(),
            max_size: inner.entries.cap().get(),
        }
    }
}

impl std::fmt::Debug for AvailabilityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityCache")
            .field("stats", &self.stats())
            .finish()
    }
}
