//! Cache statistics tracking
//!
//! A [`Statistics`] sink is attached to a cache with
//! [`LruCache::monitor`](crate::LruCache::monitor). The cache reports one hit
//! or one miss per lookup-class call; the sink counts them in total and, for
//! keys it was asked to watch, per key.
//!
//! Counters are atomics and the per-key table sits behind a
//! `parking_lot::Mutex`, so a sink shared through `Arc` can be read from
//! another thread while the owning cache keeps running. A sink tracking no
//! keys never takes the lock when recording.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use ahash::RandomState;
use parking_lot::Mutex;

/// Hit and miss counts for a single watched key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KeyStatistics {
    /// Lookups of this key that found it cached
    pub hits: u64,
    /// Lookups of this key that did not
    pub misses: u64,
}

impl KeyStatistics {
    /// Total lookups of this key
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Point-in-time copy of the totals
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatisticsSnapshot {
    /// Hits plus misses
    pub total_accesses: u64,
    /// Lookups served from the cache
    pub total_hits: u64,
    /// Lookups of absent keys
    pub total_misses: u64,
    /// `total_hits / total_accesses`, 0.0 before the first access
    pub hit_rate: f64,
}

/// Hit/miss counters for a monitored cache
#[derive(Debug)]
pub struct Statistics<K> {
    hits: AtomicU64,
    misses: AtomicU64,
    keys: Mutex<HashMap<K, KeyStatistics, RandomState>>,
    // Mirrors `keys.len()`; written only while the lock is held
    tracked: AtomicUsize,
}

impl<K: Hash + Eq> Statistics<K> {
    /// Create a sink that only counts totals
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            keys: Mutex::new(HashMap::default()),
            tracked: AtomicUsize::new(0),
        }
    }

    /// Create a sink that additionally tracks each of `keys`
    pub fn with_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let stats = Self::new();
        {
            let mut table = stats.keys.lock();
            for key in keys {
                table.entry(key).or_default();
            }
            stats.tracked.store(table.len(), Ordering::Release);
        }
        stats
    }

    /// Start tracking `key` individually. Counts already held for it are kept.
    pub fn monitor_key(&self, key: K) {
        let mut table = self.keys.lock();
        table.entry(key).or_default();
        self.tracked.store(table.len(), Ordering::Release);
    }

    /// Stop tracking `key` individually; returns whether it was tracked.
    pub fn unmonitor_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut table = self.keys.lock();
        let removed = table.remove(key).is_some();
        self.tracked.store(table.len(), Ordering::Release);
        removed
    }

    /// Whether `key` is tracked individually
    pub fn is_monitoring_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.keys.lock().contains_key(key)
    }

    /// Number of individually tracked keys
    pub fn number_of_monitored_keys(&self) -> usize {
        self.keys.lock().len()
    }

    /// Record a cache hit for `key`
    pub fn register_hit<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if self.tracked.load(Ordering::Acquire) == 0 {
            return;
        }
        if let Some(entry) = self.keys.lock().get_mut(key) {
            entry.hits += 1;
        }
    }

    /// Record a cache miss for `key`
    pub fn register_miss<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.misses.fetch_add(1, Ordering::Relaxed);
        if self.tracked.load(Ordering::Acquire) == 0 {
            return;
        }
        if let Some(entry) = self.keys.lock().get_mut(key) {
            entry.misses += 1;
        }
    }

    /// Hits recorded for a tracked key, `None` if the key is not tracked
    pub fn hits_for<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.stats_for(key).map(|stats| stats.hits)
    }

    /// Misses recorded for a tracked key, `None` if the key is not tracked
    pub fn misses_for<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.stats_for(key).map(|stats| stats.misses)
    }

    /// Counts recorded for a tracked key
    pub fn stats_for<Q>(&self, key: &Q) -> Option<KeyStatistics>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.keys.lock().get(key).copied()
    }

    /// Copy the counts of every tracked key, in no particular order
    pub fn per_key(&self) -> Vec<(K, KeyStatistics)>
    where
        K: Clone,
    {
        self.keys
            .lock()
            .iter()
            .map(|(key, stats)| (key.clone(), *stats))
            .collect()
    }

    /// Reset all counters, keeping the set of tracked keys
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        for stats in self.keys.lock().values_mut() {
            *stats = KeyStatistics::default();
        }
    }
}

impl<K> Statistics<K> {
    /// Get total hits
    pub fn total_hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get total misses
    pub fn total_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get total lookups (hits + misses)
    pub fn total_accesses(&self) -> u64 {
        self.total_hits() + self.total_misses()
    }

    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.total_hits() as f64 / total as f64
        }
    }

    /// Calculate miss ratio (0.0 to 1.0)
    pub fn miss_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.total_misses() as f64 / total as f64
        }
    }

    /// Copy the totals
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let total_hits = self.total_hits();
        let total_misses = self.total_misses();
        let total_accesses = total_hits + total_misses;
        StatisticsSnapshot {
            total_accesses,
            total_hits,
            total_misses,
            hit_rate: if total_accesses == 0 {
                0.0
            } else {
                total_hits as f64 / total_accesses as f64
            },
        }
    }
}

impl<K: Hash + Eq> Default for Statistics<K> {
    fn default() -> Self {
        Self::new()
    }
}
