//! Property-based tests for the LRU cache engine.
//!
//! Checks the cache against a reference model through arbitrary operation
//! sequences:
//! - Capacity bound: len() <= capacity() at all times
//! - Eviction ordering: a new key at capacity evicts the oldest entry
//! - Update promotion: insert(existing_k, new_v) promotes and updates
//! - Lookups are non-promoting
//! - Shrink and capacity decrease keep the newest entries
//! - Stats consistency: hits + misses == keyed lookups + re-inserts
//! - Structural consistency: check_invariants() holds after every step

use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};

use lrucache::{LruCache, Statistics};
use std::sync::Arc;

// ────────────────────────────────────────────────────────────────────
// Strategies
// ────────────────────────────────────────────────────────────────────

fn arb_capacity() -> impl Strategy<Value = usize> {
    1usize..=16
}

fn arb_key() -> impl Strategy<Value = u16> {
    0u16..24
}

#[derive(Debug, Clone)]
enum Op {
    Insert(u16, i32),
    Lookup(u16),
    Contains(u16),
    Erase(u16),
    Shrink(usize),
    SetCapacity(usize),
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (arb_key(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => arb_key().prop_map(Op::Lookup),
        2 => arb_key().prop_map(Op::Contains),
        2 => arb_key().prop_map(Op::Erase),
        1 => (0usize..20).prop_map(Op::Shrink),
        1 => arb_capacity().prop_map(Op::SetCapacity),
        1 => Just(Op::Clear),
    ]
}

fn arb_ops(max: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arb_op(), 1..max)
}

/// Reference model: front = oldest, back = newest.
struct RefModel {
    capacity: usize,
    order: VecDeque<u16>,
    map: HashMap<u16, i32>,
    hits: u64,
    misses: u64,
}

impl RefModel {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            map: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    fn unlink(&mut self, key: u16) {
        if let Some(pos) = self.order.iter().position(|&k| k == key) {
            self.order.remove(pos);
        }
    }

    fn evict_to(&mut self, size: usize) {
        while self.map.len() > size {
            let oldest = self.order.pop_front().unwrap();
            self.map.remove(&oldest);
        }
    }

    fn insert(&mut self, key: u16, value: i32) -> bool {
        if self.map.contains_key(&key) {
            self.hits += 1;
            self.map.insert(key, value);
            self.unlink(key);
            self.order.push_back(key);
            return false;
        }
        if self.map.len() >= self.capacity {
            self.evict_to(self.capacity.saturating_sub(1));
        }
        self.map.insert(key, value);
        self.order.push_back(key);
        true
    }

    fn lookup(&mut self, key: u16) -> Option<i32> {
        let found = self.map.get(&key).copied();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    fn erase(&mut self, key: u16) -> bool {
        let removed = self.map.remove(&key).is_some();
        if removed {
            self.unlink(key);
        }
        removed
    }

    fn set_capacity(&mut self, capacity: usize) {
        self.evict_to(capacity);
        self.capacity = capacity;
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

fn recency_keys(cache: &LruCache<u16, i32>) -> Vec<u16> {
    cache.ordered_iter().map(|(k, _)| *k).collect()
}

// ────────────────────────────────────────────────────────────────────
// State-machine model checking: real cache vs reference model
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(400))]

    /// The cache matches the reference model through arbitrary operation sequences.
    #[test]
    fn prop_matches_reference_model(
        capacity in arb_capacity(),
        ops in arb_ops(80),
    ) {
        let mut cache = LruCache::new(capacity);
        let stats = cache.monitor_new();
        let mut model = RefModel::new(capacity);

        for op in &ops {
            match op {
                Op::Insert(k, v) => {
                    let result = cache.insert(*k, *v);
                    let model_inserted = model.insert(*k, *v);
                    prop_assert_eq!(
                        result.was_inserted(), model_inserted,
                        "Insert mismatch on insert({}, {})", k, v
                    );
                }
                Op::Lookup(k) => {
                    let cache_val = cache.lookup(k).ok().copied();
                    prop_assert_eq!(cache_val, model.lookup(*k), "Lookup mismatch for key={}", k);
                }
                Op::Contains(k) => {
                    let cache_has = cache.contains(k);
                    let model_has = model.lookup(*k).is_some();
                    prop_assert_eq!(cache_has, model_has, "Contains mismatch for key={}", k);
                }
                Op::Erase(k) => {
                    prop_assert_eq!(cache.erase(k), model.erase(*k), "Erase mismatch for key={}", k);
                }
                Op::Shrink(n) => {
                    cache.shrink(*n);
                    let target = (*n).min(model.map.len());
                    model.evict_to(target);
                }
                Op::SetCapacity(n) => {
                    cache.set_capacity(*n);
                    model.set_capacity(*n);
                }
                Op::Clear => {
                    cache.clear();
                    model.clear();
                }
            }

            prop_assert_eq!(cache.len(), model.map.len(), "Length mismatch after op {:?}", op);
            prop_assert!(
                cache.len() <= cache.capacity(),
                "len {} > capacity {}", cache.len(), cache.capacity()
            );
            prop_assert!(cache.check_invariants().is_ok(), "Invariants broken after op {:?}", op);
        }

        let model_order: Vec<u16> = model.order.iter().copied().collect();
        prop_assert_eq!(recency_keys(&cache), model_order, "Final recency order mismatch");
        prop_assert_eq!(stats.total_hits(), model.hits);
        prop_assert_eq!(stats.total_misses(), model.misses);
    }
}

// ────────────────────────────────────────────────────────────────────
// Lookups never reorder
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_lookup_is_non_promoting(
        capacity in arb_capacity(),
        keys in prop::collection::vec(arb_key(), 1..40),
        probes in prop::collection::vec(arb_key(), 1..40),
    ) {
        let mut cache = LruCache::new(capacity);
        for (i, &k) in keys.iter().enumerate() {
            cache.insert(k, i as i32);
        }

        let before = recency_keys(&cache);
        for k in &probes {
            let _ = cache.contains(k);
            let _ = cache.lookup(k);
            let _ = cache.find(k).is_end();
        }
        prop_assert_eq!(recency_keys(&cache), before);
    }
}

// ────────────────────────────────────────────────────────────────────
// Shrink keeps the newest entries
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_shrink_keeps_newest(
        capacity in arb_capacity(),
        keys in prop::collection::vec(arb_key(), 1..60),
        target in 0usize..20,
    ) {
        let mut cache = LruCache::new(capacity);
        for (i, &k) in keys.iter().enumerate() {
            cache.insert(k, i as i32);
        }

        let before = recency_keys(&cache);
        cache.shrink(target);
        let kept = before.len().min(target);
        prop_assert_eq!(recency_keys(&cache), before[before.len() - kept..].to_vec());
    }
}

// ────────────────────────────────────────────────────────────────────
// Views agree
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Both iteration orders visit the same set of entries, and cursors walk
    /// them like the iterators do.
    #[test]
    fn prop_views_cover_same_entries(
        capacity in arb_capacity(),
        keys in prop::collection::vec(arb_key(), 1..60),
        erased in prop::collection::vec(arb_key(), 0..10),
    ) {
        let mut cache = LruCache::new(capacity);
        for (i, &k) in keys.iter().enumerate() {
            cache.insert(k, i as i32);
        }
        for k in &erased {
            cache.erase(k);
        }

        let mut hashed: Vec<(u16, i32)> = cache.iter().map(|(k, v)| (*k, *v)).collect();
        let mut ordered: Vec<(u16, i32)> = cache.ordered_iter().map(|(k, v)| (*k, *v)).collect();

        let mut walked = Vec::new();
        let mut cursor = cache.cursor(cache.ordered_begin());
        while let Some((k, v)) = cursor.pair() {
            walked.push((*k, *v));
            cursor.move_next();
        }
        prop_assert_eq!(&walked, &ordered);

        hashed.sort();
        ordered.sort();
        prop_assert_eq!(hashed, ordered);
    }
}

// ────────────────────────────────────────────────────────────────────
// Clone and equality
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_clone_equal_then_independent(
        capacity in arb_capacity(),
        keys in prop::collection::vec(arb_key(), 1..40),
        extra in arb_key(),
    ) {
        let mut cache = LruCache::new(capacity);
        for (i, &k) in keys.iter().enumerate() {
            cache.insert(k, i as i32);
        }

        let mut copy = cache.clone();
        prop_assert_eq!(&copy, &cache);

        copy.insert(extra, -1);
        prop_assert_ne!(&copy, &cache);
        prop_assert!(cache.check_invariants().is_ok());
        prop_assert!(copy.check_invariants().is_ok());
    }
}

// ────────────────────────────────────────────────────────────────────
// Shared statistics
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Two caches feeding one sink add up.
    #[test]
    fn prop_shared_sink_totals(
        probes_a in prop::collection::vec(arb_key(), 0..30),
        probes_b in prop::collection::vec(arb_key(), 0..30),
    ) {
        let stats = Arc::new(Statistics::new());
        let mut a = LruCache::with_entries(8, (0u16..8).map(|k| (k, 0)));
        let mut b = LruCache::with_entries(8, (8u16..16).map(|k| (k, 0)));
        a.monitor(Arc::clone(&stats));
        b.monitor(Arc::clone(&stats));

        for k in &probes_a {
            a.contains(k);
        }
        for k in &probes_b {
            b.contains(k);
        }

        prop_assert_eq!(stats.total_accesses(), (probes_a.len() + probes_b.len()) as u64);
        let expected_hits = probes_a.iter().filter(|&&k| k < 8).count()
            + probes_b.iter().filter(|&&k| (8..16).contains(&k)).count();
        prop_assert_eq!(stats.total_hits(), expected_hits as u64);
    }
}
