//! Iterators over the hash-index and recency views.

use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;

use indexmap::map;
use indexmap::IndexMap;

use crate::cache::Entry;
use crate::recency;

/// Entries in hash-index order
pub struct Iter<'a, K, V> {
    inner: map::Iter<'a, K, Entry<V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(inner: map::Iter<'a, K, Entry<V>>) -> Self {
        Self { inner }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, entry)| (key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, entry)| (key, &entry.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Entries in hash-index order, values mutable
pub struct IterMut<'a, K, V> {
    inner: map::IterMut<'a, K, Entry<V>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(inner: map::IterMut<'a, K, Entry<V>>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, entry)| (key, &mut entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|(key, entry)| (key, &mut entry.value))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owned entries in hash-index order
pub struct IntoIter<K, V> {
    inner: map::IntoIter<K, Entry<V>>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(inner: map::IntoIter<K, Entry<V>>) -> Self {
        Self { inner }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, entry)| (key, entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Entries from least to most recently promoted
pub struct OrderedIter<'a, K, V, S> {
    order: recency::Iter<'a, K>,
    index: &'a IndexMap<K, Entry<V>, S>,
}

impl<'a, K, V, S> OrderedIter<'a, K, V, S> {
    pub(crate) fn new(order: recency::Iter<'a, K>, index: &'a IndexMap<K, Entry<V>, S>) -> Self {
        Self { order, index }
    }
}

impl<'a, K, V, S> Iterator for OrderedIter<'a, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (_, key) = self.order.next()?;
        let (key, entry) = self.index.get_key_value(key)?;
        Some((key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ExactSizeIterator for OrderedIter<'_, K, V, S> {}

/// Entries from least to most recently promoted, values mutable
///
/// The walk order is resolved to index positions up front; each entry's
/// borrow is then handed out exactly once.
pub struct OrderedIterMut<'a, K, V> {
    order: std::vec::IntoIter<usize>,
    entries: Vec<Option<(&'a K, &'a mut Entry<V>)>>,
}

impl<'a, K, V> OrderedIterMut<'a, K, V> {
    pub(crate) fn new(order: Vec<usize>, entries: map::IterMut<'a, K, Entry<V>>) -> Self {
        Self {
            order: order.into_iter(),
            entries: entries.map(Some).collect(),
        }
    }
}

impl<'a, K, V> Iterator for OrderedIterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for index in self.order.by_ref() {
            if let Some((key, entry)) = self.entries.get_mut(index).and_then(Option::take) {
                return Some((key, &mut entry.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Each remaining index is distinct and still holds its borrow
        (self.order.len(), Some(self.order.len()))
    }
}

impl<K, V> ExactSizeIterator for OrderedIterMut<'_, K, V> {}
impl<K, V> FusedIterator for OrderedIterMut<'_, K, V> {}
