//! Partitioned hashing with per-bucket fingerprint indexes.

use crate::hashing::common::{reduce, splitmix64};
use probetable_core::{Hasher, Map, TableError};
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::BTreeMap;

/// Load factor at which the capacity budget doubles.
const GROW_THRESHOLD: f64 = 0.7;
/// Salt retries per fingerprint-resolution attempt.
const MAX_REBUILD_ATTEMPTS: usize = 16;

/// A bucket: entries left-justified in a vector, plus an ordered
/// fingerprint → slot index over them.
#[derive(Debug)]
struct Bucket<K, V> {
    entries: Vec<(K, V)>,
    index: BTreeMap<u32, usize>,
    salt: u64,
}

#[inline]
fn fingerprint(h: u64, salt: u64) -> u32 {
    splitmix64(h ^ salt) as u32
}

/// A fixed-budget table partitioned into buckets sized by `ln N`.
///
/// Each bucket stores its entries left-justified and resolves queries through
/// a salted 32-bit fingerprint index, so a lookup costs one index probe plus
/// one key comparison. Fingerprint collisions within a bucket are repaired by
/// re-salting the bucket; the retry schedule is drawn from a table-owned
/// seeded stream and bounded, surfacing
/// [`TableError::FingerprintResolution`] on exhaustion. The table grows
/// (doubling the budget and re-deriving the bucket shape) once the load
/// factor reaches 0.7, and also when a bucket reaches its hard capacity;
/// reinsertion after growth never grows again.
///
/// # Examples
///
/// ```rust
/// use probetable::partitioned::PartitionedMap;
/// use probetable::hashing::hashers::XXH3Hasher;
/// use probetable::Map;
///
/// let mut map = PartitionedMap::<u64, u64, XXH3Hasher<u64>>::new(16, 2.0);
/// map.insert(9, 90).unwrap();
/// assert_eq!(map.get(&9), Some(&90));
/// ```
#[derive(Debug)]
pub struct PartitionedMap<K: Eq, V, H: Hasher<K>> {
    hasher: H,
    buckets: Vec<Bucket<K, V>>,
    budget: usize,
    bucket_capacity: usize,
    shape: f64,
    len: usize,
    salts: Xoshiro256PlusPlus,
}

/// Bucket shape from the budget: capacity `⌊(ln N)³ + c·(ln N)²⌋` per bucket,
/// `max(1, ⌊N/(ln N)³⌋)` buckets.
fn derive_params(budget: usize, shape: f64) -> (usize, usize) {
    let logn = (budget as f64).ln();
    let cube = logn.powi(3);
    let bucket_capacity = ((cube + shape * logn.powi(2)).floor() as usize).max(1);
    let num_buckets = ((budget as f64 / cube).floor() as usize).max(1);
    (bucket_capacity, num_buckets)
}

impl<K: Eq, V, H: Hasher<K>> PartitionedMap<K, V, H> {
    pub const DEFAULT_CAPACITY: usize = 16;
    pub const DEFAULT_SHAPE: f64 = 2.0;
    const MIN_CAPACITY: usize = 4;

    /// Creates a table with the given capacity budget and shape constant `c`.
    pub fn new(capacity: usize, shape: f64) -> Self {
        Self::with_seed(capacity, shape, 0)
    }

    /// Creates a table with the given capacity budget, shape constant, and
    /// seed for both the hasher and the salt stream.
    pub fn with_seed(capacity: usize, shape: f64, seed: u64) -> Self {
        debug_assert!(shape > 0.0, r#""shape" must be positive"#);

        let budget = capacity.max(Self::MIN_CAPACITY);
        let (bucket_capacity, num_buckets) = derive_params(budget, shape);
        let mut salts = Xoshiro256PlusPlus::seed_from_u64(seed);
        let buckets = fresh_buckets(num_buckets, &mut salts);
        Self {
            hasher: H::from_seed(seed),
            buckets,
            budget,
            bucket_capacity,
            shape,
            len: 0,
            salts,
        }
    }

    /// Re-salt a bucket until its live fingerprints are pairwise distinct.
    fn rebuild_fingerprints(&mut self, b: usize) -> Result<(), TableError> {
        let Self {
            hasher,
            buckets,
            salts,
            ..
        } = self;
        let bucket = &mut buckets[b];
        for _ in 0..MAX_REBUILD_ATTEMPTS {
            let salt = salts.next_u64();
            let mut index = BTreeMap::new();
            let mut resolved = true;
            for (pos, (key, _)) in bucket.entries.iter().enumerate() {
                let fp = fingerprint(hasher.hash(key), salt);
                if index.insert(fp, pos).is_some() {
                    resolved = false;
                    break;
                }
            }
            if resolved {
                bucket.salt = salt;
                bucket.index = index;
                return Ok(());
            }
        }
        Err(TableError::FingerprintResolution)
    }

    fn insert_entry(&mut self, key: K, value: V, may_grow: bool) -> Result<(), TableError> {
        let h = self.hasher.hash(&key);
        let b = reduce(h, self.buckets.len());

        let fp = fingerprint(h, self.buckets[b].salt);
        if let Some(&pos) = self.buckets[b].index.get(&fp) {
            if self.buckets[b].entries[pos].0 == key {
                self.buckets[b].entries[pos].1 = value;
                return Ok(());
            }
            // A different key shares the fingerprint; re-salt and recompute.
            self.rebuild_fingerprints(b)?;
        }

        if self.buckets[b].entries.len() >= self.bucket_capacity {
            if may_grow {
                self.grow()?;
                return self.insert_entry(key, value, false);
            }
            return Err(TableError::BucketOverflow);
        }

        let mut attempts = 0;
        loop {
            let fp = fingerprint(h, self.buckets[b].salt);
            if self.buckets[b].index.contains_key(&fp) {
                attempts += 1;
                if attempts > MAX_REBUILD_ATTEMPTS {
                    return Err(TableError::FingerprintResolution);
                }
                self.rebuild_fingerprints(b)?;
                continue;
            }
            let bucket = &mut self.buckets[b];
            let pos = bucket.entries.len();
            bucket.entries.push((key, value));
            bucket.index.insert(fp, pos);
            self.len += 1;
            return Ok(());
        }
    }

    /// Double the budget, re-derive the bucket shape, and reinsert everything.
    /// Reinsertion runs with growth disabled so it cannot recurse.
    fn grow(&mut self) -> Result<(), TableError> {
        self.budget *= 2;
        let (bucket_capacity, num_buckets) = derive_params(self.budget, self.shape);
        self.bucket_capacity = bucket_capacity;
        let old = std::mem::replace(
            &mut self.buckets,
            fresh_buckets(num_buckets, &mut self.salts),
        );
        self.len = 0;
        for bucket in old {
            for (key, value) in bucket.entries {
                self.insert_entry(key, value, false)?;
            }
        }
        Ok(())
    }

    /// Bucket and verified entry position of a key.
    fn locate(&self, key: &K) -> Option<(usize, usize)> {
        let h = self.hasher.hash(key);
        let b = reduce(h, self.buckets.len());
        let bucket = &self.buckets[b];
        let pos = *bucket.index.get(&fingerprint(h, bucket.salt))?;
        if bucket.entries[pos].0 == *key {
            Some((b, pos))
        } else {
            None
        }
    }
}

fn fresh_buckets<K, V>(count: usize, salts: &mut Xoshiro256PlusPlus) -> Vec<Bucket<K, V>> {
    (0..count)
        .map(|_| Bucket {
            entries: Vec::new(),
            index: BTreeMap::new(),
            salt: salts.next_u64(),
        })
        .collect()
}

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for PartitionedMap<K, V, H> {
    fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        if (self.len + 1) as f64 / self.budget as f64 > GROW_THRESHOLD {
            self.grow()?;
        }
        self.insert_entry(key, value, true)
    }

    fn get(&self, key: &K) -> Option<&V> {
        let (b, pos) = self.locate(key)?;
        Some(&self.buckets[b].entries[pos].1)
    }

    fn update(&mut self, key: &K, value: V) -> bool {
        match self.locate(key) {
            Some((b, pos)) => {
                self.buckets[b].entries[pos].1 = value;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        let Some((b, pos)) = self.locate(key) else {
            return false;
        };
        let bucket = &mut self.buckets[b];
        let fp = fingerprint(self.hasher.hash(key), bucket.salt);
        bucket.index.remove(&fp);
        let last = bucket.entries.len() - 1;
        // Swap with the last occupied slot to keep entries left-justified.
        bucket.entries.swap_remove(pos);
        if pos != last {
            let moved_fp = fingerprint(self.hasher.hash(&bucket.entries[pos].0), bucket.salt);
            bucket.index.insert(moved_fp, pos);
        }
        self.len -= 1;
        true
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.entries.clear();
            bucket.index.clear();
        }
        self.len = 0;
    }

    fn load_factor(&self) -> f64 {
        self.len as f64 / self.budget as f64
    }

    fn capacity(&self) -> usize {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hashers::XXH3Hasher;
    use probetable_test::generate_map_tests;
    use probetable_testing::ConstantHasher;

    fn factory<K: Eq, V, H: Hasher<K>>() -> PartitionedMap<K, V, H> {
        PartitionedMap::with_seed(16, 2.0, 11)
    }

    generate_map_tests!(PartitionedMap, XXH3Hasher, factory);

    fn left_justification_invariant(map: &PartitionedMap<u64, u64, XXH3Hasher<u64>>) {
        for bucket in &map.buckets {
            assert_eq!(bucket.index.len(), bucket.entries.len());
            let mut seen = vec![false; bucket.entries.len()];
            for (&fp, &pos) in &bucket.index {
                assert!(pos < bucket.entries.len(), "index points past the count");
                assert!(!seen[pos], "two fingerprints map to one slot");
                seen[pos] = true;
                let expected = fingerprint(map.hasher.hash(&bucket.entries[pos].0), bucket.salt);
                assert_eq!(fp, expected, "stale fingerprint in the index");
            }
        }
    }

    #[test]
    fn test_left_justification_through_churn() {
        let mut map = PartitionedMap::<u64, u64, XXH3Hasher<u64>>::with_seed(16, 2.0, 7);
        for key in 0..200_u64 {
            map.insert(key, key).unwrap();
            left_justification_invariant(&map);
        }
        for key in (0..200_u64).step_by(3) {
            assert!(map.remove(&key));
            left_justification_invariant(&map);
        }
        for key in 0..200_u64 {
            if key % 3 == 0 {
                assert_eq!(map.get(&key), None);
            } else {
                assert_eq!(map.get(&key), Some(&key));
            }
        }
    }

    #[test]
    fn test_growth_doubles_budget() {
        let mut map = PartitionedMap::<u64, u64, XXH3Hasher<u64>>::new(16, 2.0);
        assert_eq!(map.capacity(), 16);
        for key in 0..12_u64 {
            map.insert(key, key).unwrap();
        }
        assert!(map.capacity() >= 32);
        assert!(map.load_factor() <= GROW_THRESHOLD);
        for key in 0..12_u64 {
            assert_eq!(map.get(&key), Some(&key));
        }
    }

    #[test]
    fn test_degenerate_hash_exhausts_fingerprint_salts() {
        // Identical full hashes make fingerprints collide under every salt;
        // the bounded retry schedule must surface an error instead of looping.
        let mut map = PartitionedMap::<u64, u64, ConstantHasher<u64>>::new(1024, 2.0);
        map.insert(1, 10).unwrap();
        let result = map.insert(2, 20);
        assert!(matches!(result, Err(TableError::FingerprintResolution)));
        // The failed insert left the table unchanged.
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&10));
    }

    #[test]
    fn test_remove_remaps_moved_entry() {
        // A small budget keeps every key in one bucket.
        let mut map = PartitionedMap::<u64, u64, XXH3Hasher<u64>>::new(16, 2.0);
        for key in 0..8_u64 {
            map.insert(key, key * 10).unwrap();
        }
        // Removing from the middle swaps the tail entry into the hole.
        assert!(map.remove(&2));
        for key in (0..8_u64).filter(|&k| k != 2) {
            assert_eq!(map.get(&key), Some(&(key * 10)));
        }
        left_justification_invariant(&map);
    }
}
