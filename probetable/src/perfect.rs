//! Two-level perfect hashing: fixed top-level buckets over quadratic-space
//! secondary tables.

use crate::hashing::common::reduce;
use crate::slot::{empty_slots, Slot};
use probetable_core::{Hasher, Map, TableError};

/// A secondary open-addressing table behind one top-level bucket.
///
/// Sized quadratically in its live entry count (`max(2n², 4)` slots), which
/// keeps probe sequences short enough to approximate the static FKS guarantee
/// under dynamic insertion. Uses lazy deletion so removals cannot sever the
/// probe chains of neighboring keys; rebuilds discard the tombstones.
#[derive(Debug)]
struct SecondaryTable<K: Eq, V> {
    slots: Vec<Slot<K, V>>,
    live: usize,
}

impl<K: Eq, V> Default for SecondaryTable<K, V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }
}

impl<K: Eq, V> SecondaryTable<K, V> {
    /// Rebuild from scratch with the given entries; capacity `max(2n², 4)`.
    fn build<H: Hasher<K>>(&mut self, entries: Vec<(K, V)>, hasher: &H) {
        self.live = entries.len();
        let capacity = (2 * self.live * self.live).max(4);
        self.slots = empty_slots(capacity);
        for (key, value) in entries {
            let mut idx = reduce(hasher.hash(&key), capacity);
            while !self.slots[idx].is_free() {
                idx = (idx + 1) % capacity;
            }
            self.slots[idx] = Slot::Occupied(key, value);
        }
    }

    /// Collect the live entries and rebuild at the current size.
    fn rebuild<H: Hasher<K>>(&mut self, hasher: &H) {
        let mut entries = Vec::with_capacity(self.live);
        for slot in std::mem::take(&mut self.slots) {
            if let Slot::Occupied(key, value) = slot {
                entries.push((key, value));
            }
        }
        self.build(entries, hasher);
    }

    fn locate<H: Hasher<K>>(&self, key: &K, hasher: &H) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        let start = reduce(hasher.hash(key), self.slots.len());
        let mut idx = start;
        loop {
            match &self.slots[idx] {
                Slot::Empty => return None,
                slot if slot.holds(key) => return Some(idx),
                _ => {}
            }
            idx = (idx + 1) % self.slots.len();
            if idx == start {
                return None;
            }
        }
    }

    /// Insert or overwrite; returns whether a new key was added.
    fn upsert<H: Hasher<K>>(&mut self, key: K, value: V, hasher: &H) -> bool {
        if self.slots.is_empty() {
            self.build(vec![(key, value)], hasher);
            return true;
        }

        let capacity = self.slots.len();
        let start = reduce(hasher.hash(&key), capacity);
        let mut idx = start;
        let mut free = None;
        loop {
            match &mut self.slots[idx] {
                Slot::Occupied(k, v) if *k == key => {
                    *v = value;
                    return false;
                }
                Slot::Occupied(..) => {}
                Slot::Deleted => {
                    if free.is_none() {
                        free = Some(idx);
                    }
                }
                Slot::Empty => {
                    if free.is_none() {
                        free = Some(idx);
                    }
                    break;
                }
            }
            idx = (idx + 1) % capacity;
            if idx == start {
                break;
            }
        }

        match free {
            Some(idx) => {
                self.slots[idx] = Slot::Occupied(key, value);
                self.live += 1;
                if self.live > self.slots.len() / 2 {
                    self.rebuild(hasher);
                }
                true
            }
            None => {
                // The probe traversed the full bucket without finding a slot.
                self.rebuild(hasher);
                self.upsert(key, value, hasher)
            }
        }
    }

    fn update<H: Hasher<K>>(&mut self, key: &K, value: V, hasher: &H) -> bool {
        match self.locate(key, hasher) {
            Some(idx) => {
                if let Slot::Occupied(_, v) = &mut self.slots[idx] {
                    *v = value;
                }
                true
            }
            None => false,
        }
    }

    fn remove<H: Hasher<K>>(&mut self, key: &K, hasher: &H) -> bool {
        match self.locate(key, hasher) {
            Some(idx) => {
                self.slots[idx].delete();
                self.live -= 1;
                true
            }
            None => false,
        }
    }
}

/// A two-level perfect hash table.
///
/// The top level is a fixed array of secondary sub-tables indexed by
/// `hash(k) mod B`; each sub-table resolves its collisions in quadratic space.
/// The load factor denominator is the top-level bucket count, so it commonly
/// exceeds 1.
///
/// # Examples
///
/// ```rust
/// use probetable::perfect::PerfectMap;
/// use probetable::hashing::hashers::XXH3Hasher;
/// use probetable::Map;
///
/// let mut map = PerfectMap::<u64, u64, XXH3Hasher<u64>>::new(16);
/// map.insert(7, 70).unwrap();
/// assert_eq!(map.get(&7), Some(&70));
/// ```
#[derive(Debug)]
pub struct PerfectMap<K: Eq, V, H: Hasher<K>> {
    hasher: H,
    buckets: Vec<SecondaryTable<K, V>>,
    len: usize,
}

impl<K: Eq, V, H: Hasher<K>> PerfectMap<K, V, H> {
    pub const DEFAULT_BUCKETS: usize = 16;

    /// Creates a table with the given top-level bucket count.
    pub fn new(buckets: usize) -> Self {
        Self::with_seed(buckets, 0)
    }

    /// Creates a table with the given top-level bucket count and hasher seed.
    pub fn with_seed(buckets: usize, seed: u64) -> Self {
        let buckets = buckets.max(1);
        Self {
            hasher: H::from_seed(seed),
            buckets: (0..buckets).map(|_| SecondaryTable::default()).collect(),
            len: 0,
        }
    }

    #[inline]
    fn bucket(&self, key: &K) -> usize {
        reduce(self.hasher.hash(key), self.buckets.len())
    }
}

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for PerfectMap<K, V, H> {
    fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        let idx = self.bucket(&key);
        if self.buckets[idx].upsert(key, value, &self.hasher) {
            self.len += 1;
        }
        Ok(())
    }

    fn get(&self, key: &K) -> Option<&V> {
        let bucket = &self.buckets[self.bucket(key)];
        let idx = bucket.locate(key, &self.hasher)?;
        match &bucket.slots[idx] {
            Slot::Occupied(_, v) => Some(v),
            _ => unreachable!(),
        }
    }

    fn update(&mut self, key: &K, value: V) -> bool {
        let idx = self.bucket(key);
        self.buckets[idx].update(key, value, &self.hasher)
    }

    fn remove(&mut self, key: &K) -> bool {
        let idx = self.bucket(key);
        if self.buckets[idx].remove(key, &self.hasher) {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        for bucket in &mut self.buckets {
            *bucket = SecondaryTable::default();
        }
        self.len = 0;
    }

    fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    fn capacity(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hashers::XXH3Hasher;
    use probetable_test::generate_map_tests;
    use probetable_testing::ConstantHasher;

    fn factory<K: Eq, V, H: Hasher<K>>() -> PerfectMap<K, V, H> {
        // Enough top-level buckets to keep the quadratic secondaries small
        // under the 10k-key churn suite.
        PerfectMap::with_seed(256, 11)
    }

    generate_map_tests!(PerfectMap, XXH3Hasher, factory);

    #[test]
    fn test_secondary_sizing_invariant() {
        // All keys collide into one bucket, exercising repeated rebuilds.
        let mut map = PerfectMap::<u64, u64, ConstantHasher<u64>>::new(4);
        for key in 0..40_u64 {
            map.insert(key, key).unwrap();

            let bucket = &map.buckets[map.bucket(&0)];
            assert!(bucket.slots.len() >= 4);
            // The rebuild trigger keeps live occupancy at or below half the
            // quadratic capacity after every insert.
            assert!(bucket.live <= bucket.slots.len() / 2);
        }
        for key in 0..40_u64 {
            assert_eq!(map.get(&key), Some(&key));
        }
    }

    #[test]
    fn test_rebuild_after_capacity_follows_quadratic_rule() {
        let mut map = PerfectMap::<u64, u64, ConstantHasher<u64>>::new(2);
        for key in 0..10_u64 {
            map.insert(key, key * 2).unwrap();
        }
        let bucket = &map.buckets[map.bucket(&0)];
        let n = bucket.live;
        assert_eq!(n, 10);
        // Capacity was fixed by the most recent rebuild at some n' <= n with
        // 2·n'² slots; it can never fall below the half-occupancy bound.
        assert!(bucket.slots.len() >= 2 * n);

        for key in 0..10_u64 {
            assert_eq!(map.get(&key), Some(&(key * 2)));
        }
    }

    #[test]
    fn test_remove_keeps_collided_neighbors_reachable() {
        let mut map = PerfectMap::<u64, u64, ConstantHasher<u64>>::new(4);
        for key in 0..8_u64 {
            map.insert(key, key + 100).unwrap();
        }
        assert!(map.remove(&3));
        for key in (0..8_u64).filter(|&k| k != 3) {
            assert_eq!(map.get(&key), Some(&(key + 100)));
        }
        assert_eq!(map.get(&3), None);
        assert_eq!(map.len(), 7);
    }
}
