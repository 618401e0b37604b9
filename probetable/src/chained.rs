//! Fixed-capacity table with separate chaining.

use crate::hashing::common::reduce;
use probetable_core::{Hasher, Map, TableError};

/// An array of buckets, each an insertion-ordered list of entries. Never resizes.
///
/// With a fixed bucket count the load factor may exceed 1; chains simply grow.
///
/// # Examples
///
/// ```rust
/// use probetable::chained::ChainedMap;
/// use probetable::hashing::hashers::XXH3Hasher;
/// use probetable::Map;
///
/// let mut map = ChainedMap::<u64, u64, XXH3Hasher<u64>>::new(17);
/// map.insert(1, 10).unwrap();
/// assert_eq!(map.get(&1), Some(&10));
/// assert!(!map.remove(&2));
/// ```
#[derive(Debug)]
pub struct ChainedMap<K: Eq, V, H: Hasher<K>> {
    hasher: H,
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
}

impl<K: Eq, V, H: Hasher<K>> ChainedMap<K, V, H> {
    pub const DEFAULT_BUCKETS: usize = 17;

    /// Creates a table with the given bucket count.
    pub fn new(buckets: usize) -> Self {
        Self::with_seed(buckets, 0)
    }

    /// Creates a table with the given bucket count and hasher seed.
    pub fn with_seed(buckets: usize, seed: u64) -> Self {
        let buckets = buckets.max(1);
        Self {
            hasher: H::from_seed(seed),
            buckets: (0..buckets).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    #[inline]
    fn bucket(&self, key: &K) -> usize {
        reduce(self.hasher.hash(key), self.buckets.len())
    }
}

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for ChainedMap<K, V, H> {
    fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        let idx = self.bucket(&key);
        let chain = &mut self.buckets[idx];
        for (k, v) in chain.iter_mut() {
            if *k == key {
                *v = value;
                return Ok(());
            }
        }
        chain.push((key, value));
        self.len += 1;
        Ok(())
    }

    fn get(&self, key: &K) -> Option<&V> {
        let chain = &self.buckets[self.bucket(key)];
        chain.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn update(&mut self, key: &K, value: V) -> bool {
        let idx = self.bucket(key);
        for (k, v) in self.buckets[idx].iter_mut() {
            if k == key {
                *v = value;
                return true;
            }
        }
        false
    }

    fn remove(&mut self, key: &K) -> bool {
        let idx = self.bucket(key);
        let chain = &mut self.buckets[idx];
        match chain.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                // `remove` keeps the remaining chain in insertion order.
                chain.remove(pos);
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
        for chain in &mut self.buckets {
            chain.clear();
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

    fn factory<K: Eq, V, H: Hasher<K>>() -> ChainedMap<K, V, H> {
        ChainedMap::with_seed(ChainedMap::<K, V, H>::DEFAULT_BUCKETS, 11)
    }

    generate_map_tests!(ChainedMap, XXH3Hasher, factory);

    #[test]
    fn test_remove_preserves_neighbors() {
        let mut map = ChainedMap::<u64, u64, XXH3Hasher<u64>>::new(4);
        map.insert(1, 10).unwrap();
        map.insert(2, 20).unwrap();
        map.insert(3, 30).unwrap();

        assert!(map.remove(&2));
        assert_eq!(map.get(&1), Some(&10));
        assert_eq!(map.get(&3), Some(&30));
        assert_eq!(map.get(&2), None);
        assert!(!map.remove(&2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_no_duplicates_within_bucket() {
        // Single chain: every key collides.
        let mut map = ChainedMap::<u64, u64, ConstantHasher<u64>>::new(4);
        for round in 0..3_u64 {
            for key in 0..8_u64 {
                map.insert(key, key * 10 + round).unwrap();
            }
        }
        assert_eq!(map.len(), 8);
        for key in 0..8_u64 {
            assert_eq!(map.get(&key), Some(&(key * 10 + 2)));
        }
    }

    #[test]
    fn test_load_factor_can_exceed_one() {
        let mut map = ChainedMap::<u64, u64, XXH3Hasher<u64>>::new(4);
        for key in 0..16_u64 {
            map.insert(key, key).unwrap();
        }
        assert!(map.load_factor() > 1.0);
        assert_eq!(map.capacity(), 4);
    }
}
