//! Generational slot arena backing the recency sequence.
//!
//! Freed slots go on a free list and are reused by later inserts. Each slot
//! carries a generation that is bumped whenever its value is taken, so a
//! [`SlotId`] handed out before a removal no longer resolves afterwards.

/// Handle to a value stored in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> SlotId {
        let id = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index];
            debug_assert!(slot.value.is_none(), "free list names an occupied slot");
            slot.value = Some(value);
            SlotId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                value: Some(value),
                generation: 0,
            });
            SlotId {
                index: self.slots.len() - 1,
                generation: 0,
            }
        };
        self.len += 1;
        id
    }

    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every value. Slots stay allocated with bumped generations so
    /// handles issued before the clear stay dead.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(index);
        }
        self.len = 0;
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_insert_remove_reuse() {
        let mut arena = SlotArena::new();
        let id1 = arena.insert("a");
        let id2 = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id1), Some(&"a"));
        assert_eq!(arena.get(id2), Some(&"b"));

        assert_eq!(arena.remove(id1), Some("a"));
        assert_eq!(arena.len(), 1);

        let id3 = arena.insert("c");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id3), Some(&"c"));
        assert_eq!(id1.index, id3.index);
    }

    #[test]
    fn test_arena_stale_handle_after_reuse() {
        let mut arena = SlotArena::new();
        let old = arena.insert(1);
        arena.remove(old);
        let new = arena.insert(2);

        assert_eq!(old.index, new.index);
        assert!(!arena.contains(old));
        assert_eq!(arena.get(old), None);
        assert_eq!(arena.remove(old), None);
        assert_eq!(arena.get(new), Some(&2));
    }

    #[test]
    fn test_arena_clear_kills_handles() {
        let mut arena = SlotArena::with_capacity(4);
        let a = arena.insert(1);
        let b = arena.insert(2);
        arena.clear();

        assert!(arena.is_empty());
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));

        let c = arena.insert(3);
        assert_eq!(arena.get(c), Some(&3));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), None);
    }

    #[test]
    fn test_arena_get_mut() {
        let mut arena = SlotArena::new();
        let id = arena.insert(10);
        if let Some(value) = arena.get_mut(id) {
            *value = 20;
        }
        assert_eq!(arena.get(id), Some(&20));
    }
}
