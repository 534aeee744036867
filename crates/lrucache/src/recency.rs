//! Recency sequence: a doubly-linked list of keys stored in a [`SlotArena`].
//!
//! The front is the least recently promoted key (the eviction candidate), the
//! back the most recently promoted one. Nodes are addressed by [`SlotId`], so
//! unlinking and appending are O(1) without pointer chasing.
//!
//! ```text
//!   front (oldest)                                   back (newest)
//!   head ─► [id_1: a] ◄──► [id_2: b] ◄──► [id_3: c] ◄── tail
//! ```

use crate::arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug, Clone)]
struct Node<K> {
    key: K,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Ordered list of cached keys, oldest first
#[derive(Debug, Clone)]
pub(crate) struct RecencyList<K> {
    arena: SlotArena<Node<K>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<K> RecencyList<K> {
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.arena.contains(id)
    }

    /// Oldest node
    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    /// Newest node
    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    /// Key of the oldest node
    pub fn front(&self) -> Option<&K> {
        self.head.and_then(|id| self.key(id))
    }

    pub fn key(&self, id: SlotId) -> Option<&K> {
        self.arena.get(id).map(|node| &node.key)
    }

    /// Node following `id` towards the back
    pub fn next(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|node| node.next)
    }

    /// Appends `key` as the newest node.
    pub fn push_back(&mut self, key: K) -> SlotId {
        let id = self.arena.insert(Node {
            key,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => {
                if let Some(node) = self.arena.get_mut(tail) {
                    node.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Unlinks `id` and returns its key. Stale handles yield `None`.
    pub fn remove(&mut self, id: SlotId) -> Option<K> {
        let node = self.arena.remove(id)?;

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.arena.get_mut(prev) {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }

        match node.next {
            Some(next) => {
                if let Some(next_node) = self.arena.get_mut(next) {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        Some(node.key)
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates `(SlotId, &K)` from oldest to newest.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            list: self,
            current: self.head,
            remaining: self.len(),
        }
    }

    /// Iterates keys from oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(_, key)| key)
    }

    /// Walks the links in both directions and checks them against the arena.
    pub fn check_links(&self) -> Result<(), InvariantError> {
        let mut count = 0;
        let mut prev = None;
        let mut current = self.head;

        while let Some(id) = current {
            let node = self
                .arena
                .get(id)
                .ok_or_else(|| InvariantError::new("recency link names a freed node"))?;
            if node.prev != prev {
                return Err(InvariantError::new("recency back link is inconsistent"));
            }
            count += 1;
            if count > self.len() {
                return Err(InvariantError::new("recency sequence contains a cycle"));
            }
            prev = Some(id);
            current = node.next;
        }

        if prev != self.tail {
            return Err(InvariantError::new("recency tail does not end the sequence"));
        }
        if count != self.len() {
            return Err(InvariantError::new(format!(
                "recency sequence links {} nodes but holds {}",
                count,
                self.len()
            )));
        }
        Ok(())
    }
}

impl<K> Default for RecencyList<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Oldest-to-newest walk over a [`RecencyList`]
pub(crate) struct Iter<'a, K> {
    list: &'a RecencyList<K>,
    current: Option<SlotId>,
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = (SlotId, &'a K);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((id, &node.key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
