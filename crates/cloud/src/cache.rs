//! LRU cache of STAC match counts.

use std::num::NonZeroUsize;

use lru::LruCache;

/// Counts keyed by [`StacSearchParams::cache_key`](crate::StacSearchParams::cache_key).
///
/// A resolution probes the same window once per tier pair and a batch
/// revisits windows across neighbouring years, so repeated searches are
/// common.
pub struct CountCache {
    inner: LruCache<String, u64>,
}

impl CountCache {
    /// Create a new cache holding up to `capacity` counts (at least one).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(cap),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<u64> {
        self.inner.get(key).copied()
    }

    pub fn insert(&mut self, key: String, count: u64) {
        self.inner.put(key, count);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
