//! Linear-probing open-addressing table with dynamic resizing.

use crate::hashing::common::reduce;
use crate::slot::{empty_slots, Slot};
use probetable_core::{Hasher, Map, TableError};

/// Load factor beyond which the slot array is doubled.
const LOAD_THRESHOLD: f64 = 0.6;

/// A single contiguous array of three-state slots with linear probing.
///
/// The baseline design: hash to an initial index, probe sequentially on
/// collision, mark removals with tombstones, double the array once the load
/// factor crosses [`LOAD_THRESHOLD`].
///
/// # Examples
///
/// ```rust
/// use probetable::linear::LinearMap;
/// use probetable::hashing::hashers::XXH3Hasher;
/// use probetable::Map;
///
/// let mut map = LinearMap::<u64, u64, XXH3Hasher<u64>>::new(8);
/// map.insert(42, 100).unwrap();
/// map.insert(84, 200).unwrap();
/// assert_eq!(map.get(&42), Some(&100));
/// assert_eq!(map.len(), 2);
/// ```
#[derive(Debug)]
pub struct LinearMap<K: Eq, V, H: Hasher<K>> {
    hasher: H,
    slots: Vec<Slot<K, V>>,
    len: usize,
}

impl<K: Eq, V, H: Hasher<K>> LinearMap<K, V, H> {
    pub const DEFAULT_SLOTS: usize = 8;

    /// Creates a table with the given initial slot count.
    pub fn new(initial_slots: usize) -> Self {
        Self::with_seed(initial_slots, 0)
    }

    /// Creates a table with the given initial slot count and hasher seed.
    pub fn with_seed(initial_slots: usize, seed: u64) -> Self {
        let initial_slots = initial_slots.max(1);
        Self {
            hasher: H::from_seed(seed),
            slots: empty_slots(initial_slots),
            len: 0,
        }
    }

    #[inline]
    fn index(&self, key: &K) -> usize {
        reduce(self.hasher.hash(key), self.slots.len())
    }

    /// Find the slot holding `key`, stopping at the first empty slot.
    fn locate(&self, key: &K) -> Option<usize> {
        let start = self.index(key);
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

    /// Double the slot array and reinsert all occupied entries.
    fn resize(&mut self) {
        let doubled = self.slots.len() * 2;
        let old = std::mem::replace(&mut self.slots, empty_slots(doubled));
        for slot in old {
            if let Slot::Occupied(key, value) = slot {
                self.place_new(key, value);
            }
        }
    }

    /// Place a key known to be absent; probes to the first free slot.
    fn place_new(&mut self, key: K, value: V) {
        let mut idx = self.index(&key);
        while !self.slots[idx].is_free() {
            idx = (idx + 1) % self.slots.len();
        }
        self.slots[idx] = Slot::Occupied(key, value);
    }
}

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for LinearMap<K, V, H> {
    fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        if (self.len + 1) as f64 / self.slots.len() as f64 > LOAD_THRESHOLD {
            self.resize();
        }

        let start = self.index(&key);
        let mut idx = start;
        let mut free = None;
        // Scan up to the first empty slot so an existing entry beyond a
        // tombstone is overwritten rather than duplicated at the tombstone.
        loop {
            match &mut self.slots[idx] {
                Slot::Occupied(k, v) if *k == key => {
                    *v = value;
                    return Ok(());
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
            idx = (idx + 1) % self.slots.len();
            if idx == start {
                break;
            }
        }

        match free {
            Some(idx) => {
                self.slots[idx] = Slot::Occupied(key, value);
                self.len += 1;
                Ok(())
            }
            None => {
                // Wrapped through a fully occupied array.
                self.resize();
                self.insert(key, value)
            }
        }
    }

    fn get(&self, key: &K) -> Option<&V> {
        let idx = self.locate(key)?;
        match &self.slots[idx] {
            Slot::Occupied(_, v) => Some(v),
            _ => unreachable!(),
        }
    }

    fn update(&mut self, key: &K, value: V) -> bool {
        match self.locate(key) {
            Some(idx) => {
                if let Slot::Occupied(_, v) = &mut self.slots[idx] {
                    *v = value;
                }
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        match self.locate(key) {
            Some(idx) => {
                self.slots[idx].delete();
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.len = 0;
    }

    fn load_factor(&self) -> f64 {
        self.len as f64 / self.slots.len() as f64
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hashers::XXH3Hasher;
    use probetable_test::generate_map_tests;
    use probetable_testing::ConstantHasher;

    fn factory<K: Eq, V, H: Hasher<K>>() -> LinearMap<K, V, H> {
        LinearMap::with_seed(LinearMap::<K, V, H>::DEFAULT_SLOTS, 11)
    }

    generate_map_tests!(LinearMap, XXH3Hasher, factory);

    #[test]
    fn test_insert_lookup_update_scenario() {
        let mut map = LinearMap::<u64, u64, XXH3Hasher<u64>>::new(8);
        map.insert(42, 100).unwrap();
        map.insert(84, 200).unwrap();
        map.insert(42, 300).unwrap();

        assert_eq!(map.get(&42), Some(&300));
        assert_eq!(map.get(&84), Some(&200));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_no_duplicate_beyond_tombstone() {
        // Every key probes the same chain, so after removing the head the
        // survivors sit beyond a tombstone.
        let mut map = LinearMap::<u64, u64, ConstantHasher<u64>>::new(16);
        map.insert(1, 10).unwrap();
        map.insert(2, 20).unwrap();
        map.insert(3, 30).unwrap();

        assert!(map.remove(&1));
        // Overwriting a key that sits beyond the tombstone must not create a
        // second live copy in the freed slot.
        map.insert(3, 33).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&3), Some(&33));

        assert!(map.remove(&3));
        assert_eq!(map.get(&3), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&2), Some(&20));
    }

    #[test]
    fn test_tombstone_does_not_terminate_lookup() {
        let mut map = LinearMap::<u64, u64, ConstantHasher<u64>>::new(16);
        map.insert(1, 10).unwrap();
        map.insert(2, 20).unwrap();
        map.insert(3, 30).unwrap();

        assert!(map.remove(&2));
        assert_eq!(map.get(&3), Some(&30));
    }

    #[test]
    fn test_full_wrap_resizes() {
        // A single-slot table forces the wrap path on the second distinct key.
        let mut map = LinearMap::<u64, u64, XXH3Hasher<u64>>::new(1);
        map.insert(1, 1).unwrap();
        map.insert(2, 2).unwrap();
        assert_eq!(map.get(&1), Some(&1));
        assert_eq!(map.get(&2), Some(&2));
        assert!(map.capacity() >= 2);
    }
}
