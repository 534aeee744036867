//! Capability interface shared by cache variants.
//!
//! [`Cache`] covers the keyed operations every bounded cache offers, so code
//! can be written against `impl Cache<K, V>` or `&mut dyn Cache<K, V>` without
//! naming the concrete variant or its hash strategy.

use std::hash::{BuildHasher, Hash};

use crate::cache::LruCache;

/// Keyed operations of a bounded cache
pub trait Cache<K, V> {
    /// Check if `key` is cached
    fn contains(&self, key: &K) -> bool;

    /// Get the value for `key`
    fn get(&self, key: &K) -> Option<&V>;

    /// Insert or replace; returns `true` if the key was new
    fn insert(&mut self, key: K, value: V) -> bool;

    /// Remove `key`; returns whether it was cached
    fn erase(&mut self, key: &K) -> bool;

    /// Number of cached entries
    fn len(&self) -> usize;

    /// Check if the cache is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries
    fn capacity(&self) -> usize;

    /// Change the maximum number of entries, evicting if needed
    fn set_capacity(&mut self, capacity: usize);

    /// Remove every entry
    fn clear(&mut self);
}

impl<K, V, S> Cache<K, V> for LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn contains(&self, key: &K) -> bool {
        LruCache::contains(self, key)
    }

    fn get(&self, key: &K) -> Option<&V> {
        LruCache::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        LruCache::insert(self, key, value).was_inserted()
    }

    fn erase(&mut self, key: &K) -> bool {
        LruCache::erase(self, key)
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn capacity(&self) -> usize {
        LruCache::capacity(self)
    }

    fn set_capacity(&mut self, capacity: usize) {
        LruCache::set_capacity(self, capacity)
    }

    fn clear(&mut self) {
        LruCache::clear(self)
    }
}
