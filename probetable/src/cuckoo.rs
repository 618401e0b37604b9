//! Cuckoo hashing with two tables and displacement chains.

use crate::hashing::common::reduce;
use probetable_core::{Hasher, Map, TableError};

/// Two equally sized slot arrays addressed by two hash functions.
///
/// A key lives in `left[h1(k)]` or `right[h2(k)]`, never both, so lookup,
/// update, and removal probe exactly two slots. Insertion runs a displacement
/// chain, kicking resident entries between the tables; the chain is capped at
/// the per-table capacity, and hitting the cap doubles both tables.
///
/// The two index functions are derived from one underlying key hash
/// (`h1 = h mod C`, `h2 = ((h >> 16) ^ h) mod C`). They are functionally
/// independent at the low-order bits, which keeps insertion traces
/// bit-for-bit reproducible across runs with the same seed; a second
/// independent hash family would be preferable under adversarial workloads.
///
/// # Examples
///
/// ```rust
/// use probetable::cuckoo::CuckooMap;
/// use probetable::hashing::hashers::XXH3Hasher;
/// use probetable::Map;
///
/// let mut map = CuckooMap::<u64, u64, XXH3Hasher<u64>>::new(16);
/// map.insert(5, 50).unwrap();
/// assert_eq!(map.get(&5), Some(&50));
/// ```
#[derive(Debug)]
pub struct CuckooMap<K: Eq, V, H: Hasher<K>> {
    hasher: H,
    left: Vec<Option<(K, V)>>,
    right: Vec<Option<(K, V)>>,
    per_table: usize,
    len: usize,
}

fn vacant_slots<K, V>(len: usize) -> Vec<Option<(K, V)>> {
    let mut slots = Vec::with_capacity(len);
    slots.resize_with(len, || None);
    slots
}

impl<K: Eq, V, H: Hasher<K>> CuckooMap<K, V, H> {
    pub const DEFAULT_PER_TABLE: usize = 16;

    /// Creates a table pair with the given per-table capacity.
    pub fn new(per_table: usize) -> Self {
        Self::with_seed(per_table, 0)
    }

    /// Creates a table pair with the given per-table capacity and hasher seed.
    pub fn with_seed(per_table: usize, seed: u64) -> Self {
        let per_table = per_table.max(1);
        Self {
            hasher: H::from_seed(seed),
            left: vacant_slots(per_table),
            right: vacant_slots(per_table),
            per_table,
            len: 0,
        }
    }

    #[inline]
    fn index_left(&self, key: &K) -> usize {
        reduce(self.hasher.hash(key), self.per_table)
    }

    #[inline]
    fn index_right(&self, key: &K) -> usize {
        let h = self.hasher.hash(key);
        reduce((h >> 16) ^ h, self.per_table)
    }

    /// Run the displacement chain for a key known to be absent.
    fn place(&mut self, key: K, value: V) {
        let mut cur = (key, value);
        let mut kicks = 0;
        while kicks < self.per_table {
            let i1 = self.index_left(&cur.0);
            match &mut self.left[i1] {
                slot @ None => {
                    *slot = Some(cur);
                    self.len += 1;
                    return;
                }
                Some(resident) => std::mem::swap(resident, &mut cur),
            }

            let i2 = self.index_right(&cur.0);
            match &mut self.right[i2] {
                slot @ None => {
                    *slot = Some(cur);
                    self.len += 1;
                    return;
                }
                Some(resident) => std::mem::swap(resident, &mut cur),
            }

            kicks += 1;
        }
        self.grow(cur);
    }

    /// Double both tables, reinsert every resident entry plus the in-flight one.
    fn grow(&mut self, pending: (K, V)) {
        self.per_table *= 2;
        let old_left = std::mem::replace(&mut self.left, vacant_slots(self.per_table));
        let old_right = std::mem::replace(&mut self.right, vacant_slots(self.per_table));
        self.len = 0;
        for slot in old_left.into_iter().chain(old_right) {
            if let Some((key, value)) = slot {
                self.place(key, value);
            }
        }
        self.place(pending.0, pending.1);
    }
}

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for CuckooMap<K, V, H> {
    fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        let i1 = self.index_left(&key);
        if let Some((k, v)) = &mut self.left[i1] {
            if *k == key {
                *v = value;
                return Ok(());
            }
        }
        let i2 = self.index_right(&key);
        if let Some((k, v)) = &mut self.right[i2] {
            if *k == key {
                *v = value;
                return Ok(());
            }
        }
        self.place(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> Option<&V> {
        if let Some((k, v)) = &self.left[self.index_left(key)] {
            if k == key {
                return Some(v);
            }
        }
        if let Some((k, v)) = &self.right[self.index_right(key)] {
            if k == key {
                return Some(v);
            }
        }
        None
    }

    fn update(&mut self, key: &K, value: V) -> bool {
        let i1 = self.index_left(key);
        if let Some((k, v)) = &mut self.left[i1] {
            if k == key {
                *v = value;
                return true;
            }
        }
        let i2 = self.index_right(key);
        if let Some((k, v)) = &mut self.right[i2] {
            if k == key {
                *v = value;
                return true;
            }
        }
        false
    }

    fn remove(&mut self, key: &K) -> bool {
        let i1 = self.index_left(key);
        if matches!(&self.left[i1], Some((k, _)) if k == key) {
            self.left[i1] = None;
            self.len -= 1;
            return true;
        }
        let i2 = self.index_right(key);
        if matches!(&self.right[i2], Some((k, _)) if k == key) {
            self.right[i2] = None;
            self.len -= 1;
            return true;
        }
        false
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        for slot in self.left.iter_mut().chain(self.right.iter_mut()) {
            *slot = None;
        }
        self.len = 0;
    }

    fn load_factor(&self) -> f64 {
        self.len as f64 / (2 * self.per_table) as f64
    }

    fn capacity(&self) -> usize {
        self.per_table
    }
}
