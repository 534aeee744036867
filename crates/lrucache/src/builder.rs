//! Builder for [`LruCache`] construction options.
//!
//! ```rust
//! use std::sync::Arc;
//! use lrucache::{LruCacheBuilder, Statistics};
//!
//! let stats = Arc::new(Statistics::new());
//! let cache = LruCacheBuilder::new(2)
//!     .statistics(Arc::clone(&stats))
//!     .entries([("a", 1), ("b", 2), ("c", 3)])
//!     .build();
//!
//! assert_eq!(cache.len(), 2);
//! assert!(!cache.contains("a"));
//! assert_eq!(stats.total_misses(), 1);
//! ```

use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use ahash::RandomState;

use crate::cache::LruCache;
use crate::stats::Statistics;

/// Collects construction options for an [`LruCache`]
pub struct LruCacheBuilder<K, V, S = RandomState> {
    capacity: usize,
    hasher: S,
    statistics: Option<Arc<Statistics<K>>>,
    entries: Vec<(K, V)>,
}

impl<K, V> LruCacheBuilder<K, V, RandomState> {
    /// Start a builder for a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            hasher: RandomState::new(),
            statistics: None,
            entries: Vec::new(),
        }
    }
}

impl<K, V, S> LruCacheBuilder<K, V, S> {
    /// Use `hasher` for the hash index
    pub fn hasher<H>(self, hasher: H) -> LruCacheBuilder<K, V, H> {
        LruCacheBuilder {
            capacity: self.capacity,
            hasher,
            statistics: self.statistics,
            entries: self.entries,
        }
    }

    /// Attach `statistics` once the cache is built
    pub fn statistics(mut self, statistics: Arc<Statistics<K>>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Insert `entries` in order after construction
    pub fn entries<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.entries.extend(entries);
        self
    }
}

impl<K, V, S> LruCacheBuilder<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Build the cache. Initial entries are inserted before statistics are
    /// attached, so they are not counted.
    pub fn build(self) -> LruCache<K, V, S> {
        let mut cache = LruCache::with_hasher(self.capacity, self.hasher);
        cache.insert_all(self.entries);
        if let Some(statistics) = self.statistics {
            cache.monitor(statistics);
        }
        cache
    }
}
