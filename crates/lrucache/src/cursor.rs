//! Positions and cursors over the two views of a cache.
//!
//! A position is a detached, `Copy` handle naming one entry of one cache in
//! one iteration order. It does not borrow the cache; it carries the identity
//! of the cache that issued it, and resolving it against any other cache
//! yields nothing.
//!
//! - [`UnorderedPosition`] walks the hash index in its native order.
//! - [`OrderedPosition`] walks the recency sequence, oldest to newest.
//!
//! Both kinds name the same set of entries and convert into one another.
//! `Default` gives the end position; two end positions of the same kind are
//! equal regardless of which cache they came from.
//!
//! A [`Cursor`] pairs a position with a borrow of its cache. The same type
//! serves every combination of view and mutability: `Cursor<&LruCache, P>`
//! reads, `Cursor<&mut LruCache, P>` can also write values and remove the
//! current entry.
//!
//! # Invalidation
//!
//! Removing an entry (erase, eviction, clear, shrink, capacity decrease)
//! invalidates positions naming it. Ordered positions detect this and resolve
//! to nothing. Unordered positions are plain index positions: after a removal
//! they may name whatever entry moved into that slot, so callers must discard
//! them.

use std::hash::{BuildHasher, Hash};
use std::ops::Deref;

use ahash::RandomState;

use crate::arena::SlotId;
use crate::cache::{LruCache, OwnerId};

mod private {
    pub trait Sealed {}
}

/// A position in one of the two iteration orders of an [`LruCache`].
///
/// Sealed: implemented by [`UnorderedPosition`] and [`OrderedPosition`] only.
pub trait Position: Copy + Eq + Default + private::Sealed {
    /// Hash-index position of the entry this handle names, if it is live and
    /// belongs to `cache`.
    #[doc(hidden)]
    fn resolve<K, V, S>(self, cache: &LruCache<K, V, S>) -> Option<usize>
    where
        K: Hash + Eq + Clone,
        S: BuildHasher;

    /// The position after this one in the same order.
    #[doc(hidden)]
    fn successor<K, V, S>(self, cache: &LruCache<K, V, S>) -> Self
    where
        K: Hash + Eq + Clone,
        S: BuildHasher;

    /// The position of the entry at hash-index position `index`.
    #[doc(hidden)]
    fn from_index<K, V, S>(cache: &LruCache<K, V, S>, index: Option<usize>) -> Self
    where
        K: Hash + Eq + Clone,
        S: BuildHasher;

    /// Where a cursor continues after the entry at `self` was removed, given
    /// the `successor` computed before the removal.
    #[doc(hidden)]
    fn after_removal<K, V, S>(self, successor: Self, cache: &LruCache<K, V, S>) -> Self
    where
        K: Hash + Eq + Clone,
        S: BuildHasher;
}

/// Position in hash-index order
#[derive(Debug, Clone, Copy, Default)]
pub struct UnorderedPosition {
    owner: OwnerId,
    index: Option<usize>,
}

impl UnorderedPosition {
    pub(crate) fn at(owner: OwnerId, index: usize) -> Self {
        Self {
            owner,
            index: Some(index),
        }
    }

    pub(crate) fn end(owner: OwnerId) -> Self {
        Self { owner, index: None }
    }

    /// Whether this is an end position
    pub fn is_end(&self) -> bool {
        self.index.is_none()
    }
}

impl PartialEq for UnorderedPosition {
    fn eq(&self, other: &Self) -> bool {
        match (self.index, other.index) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b && self.owner == other.owner,
            _ => false,
        }
    }
}

impl Eq for UnorderedPosition {}

impl private::Sealed for UnorderedPosition {}

impl Position for UnorderedPosition {
    fn resolve<K, V, S>(self, cache: &LruCache<K, V, S>) -> Option<usize>
    where
        K: Hash + Eq + Clone,
        S: BuildHasher,
    {
        if self.owner != cache.owner() {
            return None;
        }
        self.index.filter(|&index| index < cache.len())
    }

    fn successor<K, V, S>(self, cache: &LruCache<K, V, S>) -> Self
    where
        K: Hash + Eq + Clone,
        S: BuildHasher,
    {
        match self.resolve(cache) {
            Some(index) if index + 1 < cache.len() => Self::at(self.owner, index + 1),
            _ => Self::end(self.owner),
        }
    }

    fn from_index<K, V, S>(cache: &LruCache<K, V, S>, index: Option<usize>) -> Self
    where
        K: Hash + Eq + Clone,
        S: BuildHasher,
    {
        match index {
            Some(index) if index < cache.len() => Self::at(cache.owner(), index),
            _ => Self::end(cache.owner()),
        }
    }

    // Removal swaps the last entry into the freed index, so the walk resumes
    // at the same index.
    fn after_removal<K, V, S>(self, _successor: Self, cache: &LruCache<K, V, S>) -> Self
    where
        K: Hash + Eq + Clone,
        S: BuildHasher,
    {
        Self::from_index(cache, self.index)
    }
}

/// Position in recency order (oldest to newest)
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedPosition {
    owner: OwnerId,
    node: Option<SlotId>,
}

impl OrderedPosition {
    pub(crate) fn at(owner: OwnerId, node: Option<SlotId>) -> Self {
        Self { owner, node }
    }

    /// Whether this is an end position
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }
}

impl PartialEq for OrderedPosition {
    fn eq(&self, other: &Self) -> bool {
        match (self.node, other.node) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b && self.owner == other.owner,
            _ => false,
        }
    }
}

impl Eq for OrderedPosition {}

impl private::Sealed for OrderedPosition {}

impl Position for OrderedPosition {
    fn resolve<K, V, S>(self, cache: &LruCache<K, V, S>) -> Option<usize>
    where
        K: Hash + Eq + Clone,
        S: BuildHasher,
    {
        if self.owner != cache.owner() {
            return None;
        }
        cache.index_of_node(self.node?)
    }

    fn successor<K, V, S>(self, cache: &LruCache<K, V, S>) -> Self
    where
        K: Hash + Eq + Clone,
        S: BuildHasher,
    {
        if self.owner != cache.owner() {
            return Self::at(self.owner, None);
        }
        Self::at(self.owner, self.node.and_then(|node| cache.next_node(node)))
    }

    fn from_index<K, V, S>(cache: &LruCache<K, V, S>, index: Option<usize>) -> Self
    where
        K: Hash + Eq + Clone,
        S: BuildHasher,
    {
        Self::at(cache.owner(), index.and_then(|index| cache.node_at(index)))
    }

    fn after_removal<K, V, S>(self, successor: Self, _cache: &LruCache<K, V, S>) -> Self
    where
        K: Hash + Eq + Clone,
        S: BuildHasher,
    {
        successor
    }
}

/// A position bound to a borrow of its cache
///
/// `R` is `&LruCache` for read-only cursors and `&mut LruCache` for mutable
/// ones; `P` picks the iteration order.
pub struct Cursor<R, P> {
    cache: R,
    position: P,
}

/// Read-only cursor in hash-index order
pub type UnorderedCursor<'a, K, V, S = RandomState> =
    Cursor<&'a LruCache<K, V, S>, UnorderedPosition>;

/// Mutable cursor in hash-index order
pub type UnorderedCursorMut<'a, K, V, S = RandomState> =
    Cursor<&'a mut LruCache<K, V, S>, UnorderedPosition>;

/// Read-only cursor in recency order
pub type OrderedCursor<'a, K, V, S = RandomState> = Cursor<&'a LruCache<K, V, S>, OrderedPosition>;

/// Mutable cursor in recency order
pub type OrderedCursorMut<'a, K, V, S = RandomState> =
    Cursor<&'a mut LruCache<K, V, S>, OrderedPosition>;

impl<R, P> Cursor<R, P> {
    pub(crate) fn new(cache: R, position: P) -> Self {
        Self { cache, position }
    }
}

impl<R, P, K, V, S> Cursor<R, P>
where
    R: Deref<Target = LruCache<K, V, S>>,
    P: Position,
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// The detached position this cursor is at
    pub fn position(&self) -> P {
        self.position
    }

    /// Whether the cursor is past the last entry, or its entry is gone
    pub fn is_end(&self) -> bool {
        self.position.resolve(&*self.cache).is_none()
    }

    /// Key and value at the cursor
    pub fn pair<'s>(&'s self) -> Option<(&'s K, &'s V)>
    where
        K: 's,
        V: 's,
        S: 's,
    {
        let index = self.position.resolve(&*self.cache)?;
        self.cache.entry_at(index)
    }

    /// Key at the cursor
    pub fn key<'s>(&'s self) -> Option<&'s K>
    where
        K: 's,
        V: 's,
        S: 's,
    {
        self.pair().map(|(key, _)| key)
    }

    /// Value at the cursor
    pub fn value<'s>(&'s self) -> Option<&'s V>
    where
        K: 's,
        V: 's,
        S: 's,
    {
        self.pair().map(|(_, value)| value)
    }

    /// Advance to the next entry in this cursor's order
    pub fn move_next(&mut self) {
        self.position = self.position.successor(&*self.cache);
    }
}

impl<R, K, V, S> Cursor<R, UnorderedPosition>
where
    R: Deref<Target = LruCache<K, V, S>>,
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Same entry, recency order
    pub fn into_ordered(self) -> Cursor<R, OrderedPosition> {
        let position = self.cache.to_ordered(self.position);
        Cursor {
            cache: self.cache,
            position,
        }
    }
}

impl<R, K, V, S> Cursor<R, OrderedPosition>
where
    R: Deref<Target = LruCache<K, V, S>>,
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Same entry, hash-index order
    pub fn into_unordered(self) -> Cursor<R, UnorderedPosition> {
        let position = self.cache.to_unordered(self.position);
        Cursor {
            cache: self.cache,
            position,
        }
    }
}

impl<'a, P, K, V, S> Cursor<&'a mut LruCache<K, V, S>, P>
where
    P: Position,
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Key and mutable value at the cursor
    pub fn pair_mut(&mut self) -> Option<(&K, &mut V)> {
        let index = self.position.resolve(&*self.cache)?;
        self.cache.entry_at_mut(index)
    }

    /// Mutable value at the cursor
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.pair_mut().map(|(_, value)| value)
    }

    /// Remove the entry at the cursor and move to the entry that followed it.
    ///
    /// Returns `None` without moving when the cursor is at the end.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let index = self.position.resolve(&*self.cache)?;
        let successor = self.position.successor(&*self.cache);
        let removed = self.cache.remove_index(index);
        self.position = self.position.after_removal(successor, &*self.cache);
        removed
    }

    /// Read-only view of this cursor
    pub fn as_cursor(&self) -> Cursor<&LruCache<K, V, S>, P> {
        Cursor {
            cache: &*self.cache,
            position: self.position,
        }
    }
}

impl<'a, P, K, V, S> From<Cursor<&'a mut LruCache<K, V, S>, P>> for Cursor<&'a LruCache<K, V, S>, P> {
    fn from(cursor: Cursor<&'a mut LruCache<K, V, S>, P>) -> Self {
        Cursor {
            cache: &*cursor.cache,
            position: cursor.position,
        }
    }
}

impl<R, P: PartialEq> PartialEq for Cursor<R, P> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}
