//! LruCache: bounded cache with least-recently-promoted eviction
//!
//! ## Structure
//! - **Hash index**: `IndexMap<K, Entry<V>>` keyed by the cache key; each entry
//!   holds the value and the handle of its recency node
//! - **Recency sequence**: arena-backed linked list of keys, oldest at the
//!   front, evicted from the front
//! - **Last-accessed slot**: index position of the entry touched most
//!   recently, checked before the hash index on every keyed operation
//!
//! Only insertion promotes. `contains`, `lookup` and `find` leave the recency
//! order untouched.
//!
//! ## Last-accessed slot
//! The slot lives in a `Cell` because read-only lookups update it too. It is
//! set by every successful lookup and insert, and cleared whenever the entry it
//! names leaves the index or moves inside it: erase by key or position,
//! eviction, `clear`, `shrink`, capacity decrease. `swap` exchanges it along
//! with the rest of the state and `clone` starts the copy with an empty slot.

use std::borrow::Borrow;
use std::cell::Cell;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::ops::Index;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::RandomState;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::arena::SlotId;
use crate::cursor::{Cursor, OrderedPosition, Position, UnorderedPosition};
use crate::error::{Error, InvariantError, Result};
use crate::iter::{IntoIter, Iter, IterMut, OrderedIter, OrderedIterMut};
use crate::recency::RecencyList;
use crate::stats::Statistics;

/// Upper bound on the index and arena space reserved up front
const MAX_PREALLOC: usize = 4096;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Identity of a cache instance, carried by the positions it hands out.
/// Zero is never issued and marks default-constructed positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) struct OwnerId(u64);

impl OwnerId {
    fn next() -> Self {
        OwnerId(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Value slot of the hash index
#[derive(Debug, Clone)]
pub(crate) struct Entry<V> {
    pub(crate) value: V,
    pub(crate) node: SlotId,
}

/// Outcome of [`LruCache::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionResult {
    inserted: bool,
    position: UnorderedPosition,
}

impl InsertionResult {
    /// `true` if the key was new, `false` if an existing value was replaced
    pub fn was_inserted(&self) -> bool {
        self.inserted
    }

    /// Hash-order position of the inserted or replaced entry
    pub fn position(&self) -> UnorderedPosition {
        self.position
    }
}

/// Bounded LRU cache
///
/// Not `Sync`: lookups through `&self` update the last-accessed slot. Share an
/// instance across threads only behind a lock.
pub struct LruCache<K, V, S = RandomState> {
    index: IndexMap<K, Entry<V>, S>,
    order: RecencyList<K>,
    last_accessed: Cell<Option<usize>>,
    stats: Option<Arc<Statistics<K>>>,
    capacity: usize,
    owner: OwnerId,
}

impl<K, V> LruCache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, RandomState::new())
    }

    /// Create a cache and insert `entries` in order, evicting as needed
    pub fn with_entries<I>(capacity: usize, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut cache = Self::new(capacity);
        cache.extend(entries);
        cache
    }
}

impl<K, V, S> LruCache<K, V, S> {
    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check if the next new key forces an eviction
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Entries that can be added before eviction starts
    pub fn space_left(&self) -> usize {
        self.capacity.saturating_sub(self.len())
    }

    /// The hash strategy of the index
    pub fn hasher(&self) -> &S {
        self.index.hasher()
    }

    /// Attach a statistics sink, replacing any attached one
    pub fn monitor(&mut self, statistics: Arc<Statistics<K>>) {
        debug!(replaced = self.stats.is_some(), "statistics attached");
        self.stats = Some(statistics);
    }

    /// Detach the statistics sink, if any
    pub fn stop_monitoring(&mut self) {
        if self.stats.take().is_some() {
            debug!("statistics detached");
        }
    }

    /// Whether a statistics sink is attached
    pub fn is_monitoring(&self) -> bool {
        self.stats.is_some()
    }

    /// The attached statistics sink
    pub fn statistics(&self) -> Result<&Arc<Statistics<K>>> {
        self.stats.as_ref().ok_or(Error::NotMonitoring)
    }

    /// Iterate entries in hash-index order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.index.iter())
    }

    /// Iterate entries in hash-index order with mutable values
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.index.iter_mut())
    }

    /// Keys in hash-index order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.index.keys()
    }

    /// Values in hash-index order
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.index.values().map(|entry| &entry.value)
    }

    /// Mutable values in hash-index order
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.index.values_mut().map(|entry| &mut entry.value)
    }

    /// Exchange contents with `other` in O(1)
    ///
    /// Index, recency sequence, last-accessed slot and capacity move together;
    /// positions keep naming the entries they named. Statistics sinks stay put.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.index, &mut other.index);
        std::mem::swap(&mut self.order, &mut other.order);
        self.last_accessed.swap(&other.last_accessed);
        std::mem::swap(&mut self.capacity, &mut other.capacity);
        std::mem::swap(&mut self.owner, &mut other.owner);
    }

    pub(crate) fn owner(&self) -> OwnerId {
        self.owner
    }

    pub(crate) fn entry_at(&self, index: usize) -> Option<(&K, &V)> {
        self.index
            .get_index(index)
            .map(|(key, entry)| (key, &entry.value))
    }

    pub(crate) fn entry_at_mut(&mut self, index: usize) -> Option<(&K, &mut V)> {
        self.index
            .get_index_mut(index)
            .map(|(key, entry)| (key, &mut entry.value))
    }

    pub(crate) fn node_at(&self, index: usize) -> Option<SlotId> {
        self.index.get_index(index).map(|(_, entry)| entry.node)
    }

    pub(crate) fn next_node(&self, node: SlotId) -> Option<SlotId> {
        self.order.next(node)
    }

    fn record_hit<Q>(&self, key: &Q)
    where
        K: Borrow<Q> + Hash + Eq,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(stats) = &self.stats {
            stats.register_hit(key);
        }
    }

    fn record_miss<Q>(&self, key: &Q)
    where
        K: Borrow<Q> + Hash + Eq,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(stats) = &self.stats {
            stats.register_miss(key);
        }
    }
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Create an empty cache with a custom hash strategy
    pub fn with_hasher(capacity: usize, hasher: S) -> Self {
        let reserve = capacity.min(MAX_PREALLOC);
        Self {
            index: IndexMap::with_capacity_and_hasher(reserve, hasher),
            order: RecencyList::with_capacity(reserve),
            last_accessed: Cell::new(None),
            stats: None,
            capacity,
            owner: OwnerId::next(),
        }
    }

    /// Check if `key` is cached. Does not promote.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.access(key).is_some()
    }

    /// Get the value for `key`. Does not promote.
    pub fn lookup<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.access(key).ok_or(Error::KeyNotFound)?;
        Ok(&self.index[index].value)
    }

    /// Get the value for `key` mutably. Does not promote.
    pub fn lookup_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.access(key).ok_or(Error::KeyNotFound)?;
        Ok(&mut self.index[index].value)
    }

    /// Like [`lookup`](Self::lookup), with absence as `None`
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.access(key).map(|index| &self.index[index].value)
    }

    /// Cursor at `key` in hash-index order, or at the end if absent
    pub fn find<Q>(&self, key: &Q) -> Cursor<&Self, UnorderedPosition>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = UnorderedPosition::from_index(self, self.access(key));
        Cursor::new(self, position)
    }

    /// Mutable cursor at `key` in hash-index order, or at the end if absent
    pub fn find_mut<Q>(&mut self, key: &Q) -> Cursor<&mut Self, UnorderedPosition>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = UnorderedPosition::from_index(&*self, self.access(key));
        Cursor::new(self, position)
    }

    /// Insert or replace the value for `key`
    ///
    /// A new key is appended as the most recently promoted entry, evicting
    /// the least recently promoted one first if the cache is full. An existing
    /// key gets the new value and is promoted; the size is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> InsertionResult {
        let existing = self
            .slot_index(&key)
            .or_else(|| self.index.get_index_of(&key));
        match existing {
            Some(index) => {
                self.promote(index, value);
                self.record_hit(&key);
                InsertionResult {
                    inserted: false,
                    position: UnorderedPosition::at(self.owner, index),
                }
            }
            None => self.insert_new(key, value),
        }
    }

    /// Insert every pair in order; no rollback if a later pair evicts an
    /// earlier one
    pub fn insert_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }

    /// Remove `key`; returns whether it was cached
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove(key).is_some()
    }

    /// Remove `key` and return its value
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self
            .slot_index(key)
            .or_else(|| self.index.get_index_of(key))?;
        self.remove_index(index).map(|(_, value)| value)
    }

    /// Remove the entry at `position`
    ///
    /// End positions, stale positions and positions from other caches remove
    /// nothing and return `false`.
    pub fn erase_at<P: Position>(&mut self, position: P) -> bool {
        match position.resolve(&*self) {
            Some(index) => self.remove_index(index).is_some(),
            None => false,
        }
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        debug!(entries = self.len(), "clearing cache");
        self.index.clear();
        self.order.clear();
        self.last_accessed.set(None);
    }

    /// Evict least recently promoted entries until at most `new_size` remain
    pub fn shrink(&mut self, new_size: usize) {
        if new_size >= self.len() {
            return;
        }
        if new_size == 0 {
            self.clear();
            return;
        }

        debug!(from = self.len(), to = new_size, "shrinking cache");
        while self.len() > new_size {
            if !self.evict_lru() {
                break;
            }
        }
    }

    /// Change the capacity, evicting least recently promoted entries first if
    /// the cache holds more than `new_capacity`
    pub fn set_capacity(&mut self, new_capacity: usize) {
        debug!(
            from = self.capacity,
            to = new_capacity,
            entries = self.len(),
            "changing capacity"
        );
        while self.len() > new_capacity {
            if !self.evict_lru() {
                break;
            }
        }
        self.capacity = new_capacity;
    }

    /// Attach a fresh statistics sink and return a handle to it
    pub fn monitor_new(&mut self) -> Arc<Statistics<K>> {
        let stats = Arc::new(Statistics::new());
        self.monitor(Arc::clone(&stats));
        stats
    }

    /// Iterate entries from least to most recently promoted
    pub fn ordered_iter(&self) -> OrderedIter<'_, K, V, S> {
        OrderedIter::new(self.order.iter(), &self.index)
    }

    /// Iterate entries from least to most recently promoted, with mutable
    /// values. Building the iterator walks the sequence once.
    pub fn ordered_iter_mut(&mut self) -> OrderedIterMut<'_, K, V> {
        let order: Vec<usize> = self
            .order
            .keys()
            .filter_map(|key| self.index.get_index_of(key))
            .collect();
        OrderedIterMut::new(order, self.index.iter_mut())
    }

    /// First position in hash-index order
    pub fn unordered_begin(&self) -> UnorderedPosition {
        UnorderedPosition::from_index(self, Some(0))
    }

    /// End position in hash-index order
    pub fn unordered_end(&self) -> UnorderedPosition {
        UnorderedPosition::end(self.owner)
    }

    /// Position of the least recently promoted entry
    pub fn ordered_begin(&self) -> OrderedPosition {
        OrderedPosition::at(self.owner, self.order.front_id())
    }

    /// End position in recency order
    pub fn ordered_end(&self) -> OrderedPosition {
        OrderedPosition::at(self.owner, None)
    }

    /// The recency-order position of the entry at `position`
    pub fn to_ordered(&self, position: UnorderedPosition) -> OrderedPosition {
        OrderedPosition::from_index(self, position.resolve(self))
    }

    /// The hash-order position of the entry at `position`
    pub fn to_unordered(&self, position: OrderedPosition) -> UnorderedPosition {
        UnorderedPosition::from_index(self, position.resolve(self))
    }

    /// Read-only cursor at `position`
    pub fn cursor<P: Position>(&self, position: P) -> Cursor<&Self, P> {
        Cursor::new(self, position)
    }

    /// Mutable cursor at `position`
    pub fn cursor_mut<P: Position>(&mut self, position: P) -> Cursor<&mut Self, P> {
        Cursor::new(self, position)
    }

    /// Verify that index, recency sequence and last-accessed slot agree
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        if self.index.len() != self.order.len() {
            return Err(InvariantError::new(format!(
                "index holds {} entries but recency sequence holds {}",
                self.index.len(),
                self.order.len()
            )));
        }
        if self.len() > self.capacity.max(1) {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                self.len(),
                self.capacity
            )));
        }
        self.order.check_links()?;
        for (key, entry) in &self.index {
            if !self.order.contains(entry.node) {
                return Err(InvariantError::new("entry's recency handle is stale"));
            }
            if self.order.key(entry.node) != Some(key) {
                return Err(InvariantError::new(
                    "entry's recency handle does not name its key",
                ));
            }
        }
        if let Some(slot) = self.last_accessed.get() {
            if slot >= self.index.len() {
                return Err(InvariantError::new(format!(
                    "last-accessed slot names position {} of {}",
                    slot,
                    self.index.len()
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn index_of_node(&self, node: SlotId) -> Option<usize> {
        let key = self.order.key(node)?;
        self.index.get_index_of(key)
    }

    /// Remove the entry at hash-index position `index` from both structures.
    ///
    /// The index fills the hole with its last entry, so the slot is cleared
    /// if it named either the removed or the relocated position.
    pub(crate) fn remove_index(&mut self, index: usize) -> Option<(K, V)> {
        let last = self.index.len().checked_sub(1)?;
        let (key, entry) = self.index.swap_remove_index(index)?;
        let node_key = self.order.remove(entry.node);
        debug_assert!(node_key.is_some(), "entry without recency node");

        if let Some(slot) = self.last_accessed.get() {
            if slot == index || slot == last {
                self.last_accessed.set(None);
            }
        }
        Some((key, entry.value))
    }

    /// Resolve `key` to an index position and record exactly one hit or miss.
    fn access<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(index) = self.slot_index(key) {
            self.record_hit(key);
            return Some(index);
        }

        match self.index.get_index_of(key) {
            Some(index) => {
                self.last_accessed.set(Some(index));
                self.record_hit(key);
                Some(index)
            }
            None => {
                self.record_miss(key);
                None
            }
        }
    }

    /// Index position held by the last-accessed slot, if it names `key`
    fn slot_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.last_accessed.get()?;
        let (slot_key, _) = self.index.get_index(index)?;
        (<K as Borrow<Q>>::borrow(slot_key) == key).then_some(index)
    }

    fn insert_new(&mut self, key: K, value: V) -> InsertionResult {
        if self.is_full() {
            self.evict_lru();
        }

        let node = self.order.push_back(key.clone());
        let (index, previous) = self.index.insert_full(key, Entry { value, node });
        debug_assert!(previous.is_none(), "new key already indexed");
        debug_assert_eq!(self.order.back_id(), Some(node));

        self.last_accessed.set(Some(index));
        InsertionResult {
            inserted: true,
            position: UnorderedPosition::at(self.owner, index),
        }
    }

    /// Replace the value at `index` and move its key to the back of the
    /// recency sequence under a fresh node.
    fn promote(&mut self, index: usize, value: V) {
        let Some((_, entry)) = self.index.get_index_mut(index) else {
            return;
        };

        let node_key = self.order.remove(entry.node);
        debug_assert!(node_key.is_some(), "entry without recency node");
        if let Some(node_key) = node_key {
            entry.node = self.order.push_back(node_key);
        }
        entry.value = value;
        self.last_accessed.set(Some(index));
    }

    /// Evict the front of the recency sequence; `false` if the cache is empty
    fn evict_lru(&mut self) -> bool {
        let Some(index) = self
            .order
            .front()
            .and_then(|key| self.index.get_index_of(key))
        else {
            debug_assert!(self.order.is_empty(), "recency front is not indexed");
            return false;
        };

        trace!(
            index,
            entries = self.len(),
            capacity = self.capacity,
            "evicting least recently promoted entry"
        );
        self.remove_index(index).is_some()
    }
}

impl<K, V, S> Clone for LruCache<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    /// Copies entries, recency order, capacity and the statistics handle.
    /// The copy gets its own identity and an empty last-accessed slot.
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            order: self.order.clone(),
            last_accessed: Cell::new(None),
            stats: self.stats.clone(),
            capacity: self.capacity,
            owner: OwnerId::next(),
        }
    }
}

impl<K, V, S> PartialEq for LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: PartialEq,
    S: BuildHasher,
{
    /// Equal when both hold the same pairs in the same recency order.
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.len() == other.len()
            && self.order.keys().eq(other.order.keys())
            && self.index.iter().all(|(key, entry)| {
                other
                    .index
                    .get(key)
                    .is_some_and(|theirs| theirs.value == entry.value)
            })
    }
}

impl<K, V, S> Eq for LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for LruCache<K, V, S>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Entries<'a, K, V, S>(&'a LruCache<K, V, S>);

        impl<K, V, S> fmt::Debug for Entries<'_, K, V, S>
        where
            K: Hash + Eq + Clone + fmt::Debug,
            V: fmt::Debug,
            S: BuildHasher,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_map().entries(self.0.ordered_iter()).finish()
            }
        }

        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("entries", &Entries(self))
            .finish()
    }
}

impl<K, Q, V, S> Index<&Q> for LruCache<K, V, S>
where
    K: Hash + Eq + Clone + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if `key` is not cached
    fn index(&self, key: &Q) -> &V {
        match self.lookup(key) {
            Ok(value) => value,
            Err(err) => panic!("LruCache index: {}", err),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}

impl<K, V> FromIterator<(K, V)> for LruCache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
{
    /// Capacity is the number of pairs yielded.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries: Vec<(K, V)> = iter.into_iter().collect();
        Self::with_entries(entries.len(), entries)
    }
}

impl<'a, K, V, S> IntoIterator for &'a LruCache<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut LruCache<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for LruCache<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Consumes the cache, yielding entries in hash-index order
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.index.into_iter())
    }
}
