//! Iceberg hashing: a large primary block level, a small secondary block
//! level, and per-block chained overflow.

use crate::hashing::common::reduce;
use probetable_core::{Hasher, Map, TableError};

/// Slots per primary (level-1) block.
const LV1_SLOTS: usize = 64;
/// Slots per secondary (level-2) block.
const LV2_SLOTS: usize = 8;
/// Load factor at which the block count doubles.
const GROW_THRESHOLD: f64 = 0.85;

/// Where a key currently resides.
enum Location {
    Primary(usize),
    Secondary(usize),
    Overflow(usize, usize),
}

/// Three coordinated structures keyed on one block count `B`: `B` primary
/// blocks of 64 slots, `B` secondary blocks of 8 slots, and `B` overflow
/// lists anchored at the primary index.
///
/// Slots carry an explicit occupancy marker (`Option`), so the whole key
/// domain is legal — including whatever value a sentinel-based layout would
/// have reserved.
///
/// # Examples
///
/// ```rust
/// use probetable::iceberg::IcebergMap;
/// use probetable::hashing::hashers::XXH3Hasher;
/// use probetable::Map;
///
/// let mut map = IcebergMap::<u64, u64, XXH3Hasher<u64>>::new(64);
/// map.insert(0, 42).unwrap(); // key 0 is a legitimate key
/// assert_eq!(map.get(&0), Some(&42));
/// ```
#[derive(Debug)]
pub struct IcebergMap<K: Eq, V, H: Hasher<K>> {
    hasher: H,
    level1: Vec<Option<(K, V)>>,
    level2: Vec<Option<(K, V)>>,
    level3: Vec<Vec<(K, V)>>,
    blocks: usize,
    len: usize,
}

fn vacant_slots<K, V>(len: usize) -> Vec<Option<(K, V)>> {
    let mut slots = Vec::with_capacity(len);
    slots.resize_with(len, || None);
    slots
}

impl<K: Eq, V, H: Hasher<K>> IcebergMap<K, V, H> {
    pub const DEFAULT_BLOCKS: usize = 64;

    /// Creates a table with the given initial block count.
    pub fn new(blocks: usize) -> Self {
        Self::with_seed(blocks, 0)
    }

    /// Creates a table with the given initial block count and hasher seed.
    pub fn with_seed(blocks: usize, seed: u64) -> Self {
        let blocks = blocks.max(1);
        Self {
            hasher: H::from_seed(seed),
            level1: vacant_slots(blocks * LV1_SLOTS),
            level2: vacant_slots(blocks * LV2_SLOTS),
            level3: (0..blocks).map(|_| Vec::new()).collect(),
            blocks,
            len: 0,
        }
    }

    /// The two block indices of a key: `h mod B` for level 1 (and the overflow
    /// anchor), `(h / 37) mod B` for level 2.
    #[inline]
    fn blocks_of(&self, key: &K) -> (usize, usize) {
        let h = self.hasher.hash(key);
        (reduce(h, self.blocks), reduce(h / 37, self.blocks))
    }

    fn locate(&self, key: &K) -> Option<Location> {
        let (b1, b2) = self.blocks_of(key);
        for idx in b1 * LV1_SLOTS..(b1 + 1) * LV1_SLOTS {
            if matches!(&self.level1[idx], Some((k, _)) if k == key) {
                return Some(Location::Primary(idx));
            }
        }
        for idx in b2 * LV2_SLOTS..(b2 + 1) * LV2_SLOTS {
            if matches!(&self.level2[idx], Some((k, _)) if k == key) {
                return Some(Location::Secondary(idx));
            }
        }
        for (pos, (k, _)) in self.level3[b1].iter().enumerate() {
            if k == key {
                return Some(Location::Overflow(b1, pos));
            }
        }
        None
    }

    /// Place a key known to be absent: first free primary slot, then first
    /// free secondary slot, then the overflow list.
    fn place_absent(&mut self, key: K, value: V) {
        let (b1, b2) = self.blocks_of(&key);
        for idx in b1 * LV1_SLOTS..(b1 + 1) * LV1_SLOTS {
            if self.level1[idx].is_none() {
                self.level1[idx] = Some((key, value));
                self.len += 1;
                return;
            }
        }
        for idx in b2 * LV2_SLOTS..(b2 + 1) * LV2_SLOTS {
            if self.level2[idx].is_none() {
                self.level2[idx] = Some((key, value));
                self.len += 1;
                return;
            }
        }
        self.level3[b1].push((key, value));
        self.len += 1;
    }

    /// Double the block count and redistribute every entry.
    fn grow(&mut self) {
        self.blocks *= 2;
        let old1 = std::mem::replace(&mut self.level1, vacant_slots(self.blocks * LV1_SLOTS));
        let old2 = std::mem::replace(&mut self.level2, vacant_slots(self.blocks * LV2_SLOTS));
        let old3 = std::mem::replace(
            &mut self.level3,
            (0..self.blocks).map(|_| Vec::new()).collect(),
        );
        self.len = 0;
        for (key, value) in old1.into_iter().chain(old2).flatten() {
            self.place_absent(key, value);
        }
        for (key, value) in old3.into_iter().flatten() {
            self.place_absent(key, value);
        }
    }

    #[inline]
    fn total_slots(&self) -> usize {
        self.blocks * (LV1_SLOTS + LV2_SLOTS)
    }
}

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for IcebergMap<K, V, H> {
    fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        if self.len as f64 / self.total_slots() as f64 >= GROW_THRESHOLD {
            self.grow();
        }
        match self.locate(&key) {
            Some(Location::Primary(idx)) => self.level1[idx] = Some((key, value)),
            Some(Location::Secondary(idx)) => self.level2[idx] = Some((key, value)),
            Some(Location::Overflow(block, pos)) => self.level3[block][pos] = (key, value),
            None => self.place_absent(key, value),
        }
        Ok(())
    }

    fn get(&self, key: &K) -> Option<&V> {
        match self.locate(key)? {
            Location::Primary(idx) => self.level1[idx].as_ref().map(|(_, v)| v),
            Location::Secondary(idx) => self.level2[idx].as_ref().map(|(_, v)| v),
            Location::Overflow(block, pos) => Some(&self.level3[block][pos].1),
        }
    }

    fn update(&mut self, key: &K, value: V) -> bool {
        match self.locate(key) {
            Some(Location::Primary(idx)) => {
                if let Some((_, v)) = &mut self.level1[idx] {
                    *v = value;
                }
                true
            }
            Some(Location::Secondary(idx)) => {
                if let Some((_, v)) = &mut self.level2[idx] {
                    *v = value;
                }
                true
            }
            Some(Location::Overflow(block, pos)) => {
                self.level3[block][pos].1 = value;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        match self.locate(key) {
            Some(Location::Primary(idx)) => {
                self.level1[idx] = None;
            }
            Some(Location::Secondary(idx)) => {
                self.level2[idx] = None;
            }
            Some(Location::Overflow(block, pos)) => {
                self.level3[block].swap_remove(pos);
            }
            None => return false,
        }
        self.len -= 1;
        true
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        for slot in self.level1.iter_mut() {
            *slot = None;
        }
        for slot in self.level2.iter_mut() {
            *slot = None;
        }
        for list in self.level3.iter_mut() {
            list.clear();
        }
        self.len = 0;
    }

    fn load_factor(&self) -> f64 {
        self.len as f64 / self.total_slots() as f64
    }

    fn capacity(&self) -> usize {
        self.total_slots()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hashers::XXH3Hasher;
    use probetable_test::generate_map_tests;
    use probetable_testing::ConstantHasher;

    fn factory<K: Eq, V, H: Hasher<K>>() -> IcebergMap<K, V, H> {
        IcebergMap::with_seed(4, 11)
    }

    generate_map_tests!(IcebergMap, XXH3Hasher, factory);

    #[test]
    fn test_key_zero_is_legal() {
        let mut map = IcebergMap::<u64, u64, XXH3Hasher<u64>>::new(4);
        map.insert(0, 7).unwrap();
        assert_eq!(map.get(&0), Some(&7));
        assert_eq!(map.len(), 1);
        assert!(map.remove(&0));
        assert_eq!(map.get(&0), None);
    }

    #[test]
    fn test_spills_through_all_three_levels() {
        // One block pair takes every key: 64 into level 1, 8 into level 2, and
        // the rest into the overflow list.
        let mut map = IcebergMap::<u64, u64, ConstantHasher<u64>>::new(4);
        for key in 0..100_u64 {
            map.insert(key, key + 1).unwrap();
        }
        assert_eq!(map.len(), 100);
        let anchor = map.blocks_of(&0).0;
        assert_eq!(map.level3[anchor].len(), 100 - LV1_SLOTS - LV2_SLOTS);

        for key in 0..100_u64 {
            assert_eq!(map.get(&key), Some(&(key + 1)));
        }

        // Remove one key per level and make sure the rest stay reachable.
        for key in [0_u64, 70, 99] {
            assert!(map.remove(&key));
        }
        for key in (0..100_u64).filter(|k| ![0, 70, 99].contains(k)) {
            assert_eq!(map.get(&key), Some(&(key + 1)));
        }
        assert_eq!(map.len(), 97);
    }

    #[test]
    fn test_overwrite_keeps_single_copy_across_levels() {
        let mut map = IcebergMap::<u64, u64, ConstantHasher<u64>>::new(2);
        for key in 0..80_u64 {
            map.insert(key, 0).unwrap();
        }
        // Key 75 sits in the overflow list; rewriting it must not promote a
        // second copy into a primary slot freed in the meantime.
        assert!(map.remove(&5));
        map.insert(75, 1).unwrap();
        assert_eq!(map.len(), 79);
        assert_eq!(map.get(&75), Some(&1));
    }
}
