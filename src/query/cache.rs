//! LRU cache for search responses.
//!
//! Keyed by a hash of the full request. Any executor write invalidates the
//! whole cache — syncs are frequent but bursty, and wholesale invalidation
//! keeps the staleness window at one sync rather than one cache lifetime.
//! All operations use try-lock and degrade to a miss under contention.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::query::{SearchRequest, SearchResponse};

/// Thread-safe response cache with hit/miss counters.
pub struct SearchCache {
    entries: Mutex<LruCache<u64, SearchResponse>>,
    stats: Mutex<CacheStats>,
    enabled: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl SearchCache {
    /// `capacity` of zero disables caching entirely.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(size)),
            stats: Mutex::new(CacheStats::default()),
            enabled: capacity > 0,
        }
    }

    pub fn get(&self, request: &SearchRequest) -> Option<SearchResponse> {
        if !self.enabled {
            return None;
        }
        let key = request.cache_key();
        let mut entries = self.entries.try_lock()?;
        let hit = entries.get(&key).cloned();
        if let Some(mut stats) = self.stats.try_lock() {
            if hit.is_some() {
                stats.hits += 1;
            } else {
                stats.misses += 1;
            }
        }
        hit
    }

    pub fn put(&self, request: &SearchRequest, response: SearchResponse) {
        if !self.enabled {
            return;
        }
        if let Some(mut entries) = self.entries.try_lock() {
            entries.put(request.cache_key(), response);
        }
    }

    /// Drop everything. Called after each index write.
    pub fn invalidate(&self) {
        if let Some(mut entries) = self.entries.try_lock() {
            entries.clear();
        }
        if let Some(mut stats) = self.stats.try_lock() {
            stats.invalidations += 1;
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.try_lock().map(|s| *s).unwrap_or_default()
    }
}
