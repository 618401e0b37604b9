//! Implements [`Map`] for [`FunnelMap`].

use super::core::{probe_limit, FunnelMap};
use crate::hashing::common::{reduce, GOLDEN_GAMMA};
use crate::slot::Slot;
use probetable_core::{Hasher, Map, TableError};

impl<K: Eq, V, H: Hasher<K>> FunnelMap<K, V, H> {
    /// Find the key by walking the same probe geometry placement uses. An
    /// *empty* slot terminates the scan of a bucket or probe sequence;
    /// tombstones do not.
    fn locate(&self, key: &K) -> Option<(usize, usize)> {
        let h = self.hasher.hash(key);
        for lvl in 0..self.alpha {
            let nbuckets = self.levels[lvl].len() / self.beta;
            let start = reduce(self.bucket_of(lvl, h), nbuckets) * self.beta;
            for idx in start..start + self.beta {
                match &self.levels[lvl][idx] {
                    Slot::Empty => break,
                    slot if slot.holds(key) => return Some((lvl, idx)),
                    _ => {}
                }
            }
        }
        self.locate_overflow(key, h)
    }

    fn locate_overflow(&self, key: &K, h: u64) -> Option<(usize, usize)> {
        let lvl = self.alpha;
        let m = self.levels[lvl].len();
        let half = m / 2;
        let limit = probe_limit(self.total);

        if half > 0 {
            for t in 0..limit {
                let idx = reduce(self.probe_at(h, t), half);
                match &self.levels[lvl][idx] {
                    Slot::Empty => break,
                    slot if slot.holds(key) => return Some((lvl, idx)),
                    _ => {}
                }
            }
        }

        let bucket = 2 * limit;
        if half >= 2 * bucket {
            let nb2 = half / bucket;
            let b1 = reduce(self.bucket_of(lvl, h), nb2);
            let b2 = reduce(self.bucket_of(lvl, h ^ GOLDEN_GAMMA), nb2);
            for j in 0..bucket {
                for idx in [half + b1 * bucket + j, half + b2 * bucket + j] {
                    match &self.levels[lvl][idx] {
                        Slot::Empty => break,
                        slot if slot.holds(key) => return Some((lvl, idx)),
                        _ => {}
                    }
                }
            }
        } else {
            // The second half is too small for the two-choice buckets; it is
            // scanned as one run.
            for idx in half..m {
                if self.levels[lvl][idx].holds(key) {
                    return Some((lvl, idx));
                }
            }
        }
        None
    }

    /// Insert or overwrite. Infallible: placement failure expands the table
    /// and retries.
    ///
    /// Overwrites go through a full [`Self::locate`] first: the placement
    /// scan stops at the first free slot, so reusing a tombstone that sits
    /// ahead of a still-live copy of the key would otherwise duplicate it.
    pub(super) fn upsert(&mut self, key: K, value: V) {
        if let Some((lvl, idx)) = self.locate(&key) {
            if let Slot::Occupied(_, v) = &mut self.levels[lvl][idx] {
                *v = value;
            }
            return;
        }
        self.place_absent(key, value);
    }

    /// Place a key known to be absent at the first free slot along its probe
    /// path, greedily through the primary levels and then the overflow level.
    fn place_absent(&mut self, key: K, value: V) {
        // Keep at least a δ fraction of the budget free.
        if self.live + 1 > (self.total as f64 * (1.0 - self.delta)) as usize {
            self.expand();
        }

        let h = self.hasher.hash(&key);
        for lvl in 0..self.alpha {
            let nbuckets = self.levels[lvl].len() / self.beta;
            let start = reduce(self.bucket_of(lvl, h), nbuckets) * self.beta;
            for idx in start..start + self.beta {
                if self.levels[lvl][idx].is_free() {
                    self.place(lvl, idx, key, value);
                    return;
                }
            }
        }
        self.insert_overflow(key, value);
    }

    fn insert_overflow(&mut self, key: K, value: V) {
        let h = self.hasher.hash(&key);
        let lvl = self.alpha;
        let m = self.levels[lvl].len();
        let half = m / 2;
        let limit = probe_limit(self.total);

        if half > 0 {
            for t in 0..limit {
                let idx = reduce(self.probe_at(h, t), half);
                if self.levels[lvl][idx].is_free() {
                    self.place(lvl, idx, key, value);
                    return;
                }
            }
        }

        let bucket = 2 * limit;
        if half >= 2 * bucket {
            let nb2 = half / bucket;
            let b1 = reduce(self.bucket_of(lvl, h), nb2);
            let b2 = reduce(self.bucket_of(lvl, h ^ GOLDEN_GAMMA), nb2);
            for j in 0..bucket {
                for idx in [half + b1 * bucket + j, half + b2 * bucket + j] {
                    if self.levels[lvl][idx].is_free() {
                        self.place(lvl, idx, key, value);
                        return;
                    }
                }
            }
        } else {
            for idx in half..m {
                if self.levels[lvl][idx].is_free() {
                    self.place(lvl, idx, key, value);
                    return;
                }
            }
        }

        // Neither scheme found a slot.
        self.expand();
        self.place_absent(key, value);
    }

    /// Double the budget, rebuild the cascade, and reinsert every live entry.
    fn expand(&mut self) {
        self.total *= 2;
        let old_levels = std::mem::take(&mut self.levels);
        self.build_levels();
        self.live = 0;
        for level in old_levels {
            for slot in level {
                if let Slot::Occupied(key, value) = slot {
                    // Migrated keys are unique; skip the locate pass.
                    self.place_absent(key, value);
                }
            }
        }
    }
}

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for FunnelMap<K, V, H> {
    fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        self.upsert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> Option<&V> {
        let (lvl, idx) = self.locate(key)?;
        match &self.levels[lvl][idx] {
            Slot::Occupied(_, v) => Some(v),
            _ => unreachable!(),
        }
    }

    fn update(&mut self, key: &K, value: V) -> bool {
        match self.locate(key) {
            Some((lvl, idx)) => {
                if let Slot::Occupied(_, v) = &mut self.levels[lvl][idx] {
                    *v = value;
                }
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        match self.locate(key) {
            Some((lvl, idx)) => {
                self.levels[lvl][idx].delete();
                self.occupied[lvl] -= 1;
                self.live -= 1;
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.live
    }

    fn clear(&mut self) {
        for level in &mut self.levels {
            for slot in level.iter_mut() {
                *slot = Slot::Empty;
            }
        }
        for count in &mut self.occupied {
            *count = 0;
        }
        self.live = 0;
    }

    fn load_factor(&self) -> f64 {
        self.live as f64 / self.total as f64
    }

    fn capacity(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hashers::XXH3Hasher;
    use probetable_core::TableError;
    use probetable_test::generate_map_tests;
    use probetable_testing::ConstantHasher;

    fn factory<K: Eq, V, H: Hasher<K>>() -> FunnelMap<K, V, H> {
        FunnelMap::with_seed(64, 0.1, 11).unwrap()
    }

    generate_map_tests!(FunnelMap, XXH3Hasher, factory);

    #[test]
    fn test_forced_collision_pattern() {
        let mut map = FunnelMap::<u64, u64, XXH3Hasher<u64>>::new(
            FunnelMap::<u64, u64, XXH3Hasher<u64>>::DEFAULT_CAPACITY,
            FunnelMap::<u64, u64, XXH3Hasher<u64>>::DEFAULT_DELTA,
        )
        .unwrap();
        for i in 0..200_u64 {
            let key = 0xdead_beef + 1000 * i;
            map.insert(key, 2 * key).unwrap();
        }
        for i in 0..200_u64 {
            let key = 0xdead_beef + 1000 * i;
            assert_eq!(map.get(&key), Some(&(2 * key)));
        }
        assert_eq!(map.len(), 200);
    }

    #[test]
    fn test_invalid_delta_is_rejected() {
        for delta in [0.0, 1.0, -0.5, 1.5] {
            let result = FunnelMap::<u64, u64, XXH3Hasher<u64>>::new(1024, delta);
            assert!(matches!(result, Err(TableError::InvalidFreeFraction(_))));
        }
    }

    #[test]
    fn test_level_geometry() {
        let map = FunnelMap::<u64, u64, XXH3Hasher<u64>>::new(1024, 0.1).unwrap();
        assert_eq!(map.levels.len(), map.alpha + 1);
        let min_overflow = (map.delta * map.total as f64 / 2.0).ceil() as usize;
        for level in &map.levels[..map.alpha] {
            assert_eq!(level.len() % map.beta, 0);
            assert!(level.len() >= map.beta);
        }
        assert!(map.levels[map.alpha].len() >= min_overflow);
        let slots: usize = map.levels.iter().map(|l| l.len()).sum();
        assert!(slots >= map.total);
    }

    #[test]
    fn test_update_equivalent_to_overwriting_insert() {
        let mut via_update = FunnelMap::<u64, u64, XXH3Hasher<u64>>::with_seed(64, 0.1, 3).unwrap();
        let mut via_insert = FunnelMap::<u64, u64, XXH3Hasher<u64>>::with_seed(64, 0.1, 3).unwrap();
        for key in 0..40_u64 {
            via_update.insert(key, key).unwrap();
            via_insert.insert(key, key).unwrap();
        }
        for key in 0..40_u64 {
            assert!(via_update.update(&key, key + 1));
            via_insert.insert(key, key + 1).unwrap();
        }
        for key in 0..40_u64 {
            assert_eq!(via_update.get(&key), via_insert.get(&key));
        }
        assert_eq!(via_update.len(), via_insert.len());
    }

    #[test]
    fn test_overwrite_beyond_tombstone_does_not_duplicate() {
        // All keys share one bucket per level. Removing the head leaves a
        // tombstone ahead of the surviving key in its own probe path.
        let mut map = FunnelMap::<u64, u64, ConstantHasher<u64>>::new(64, 0.1).unwrap();
        map.insert(10, 0).unwrap();
        map.insert(20, 1).unwrap();
        assert!(map.remove(&10));

        // The rewrite must hit the live copy, not reoccupy the tombstone.
        map.insert(20, 2).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&20), Some(&2));

        assert!(map.remove(&20));
        assert_eq!(map.get(&20), None);
        assert!(!map.remove(&20));
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_tombstones_are_reused() {
        let mut map = FunnelMap::<u64, u64, XXH3Hasher<u64>>::with_seed(64, 0.1, 5).unwrap();
        for key in 0..50_u64 {
            map.insert(key, key).unwrap();
        }
        let capacity = map.capacity();
        for round in 0..20_u64 {
            for key in 0..50_u64 {
                assert!(map.remove(&key));
            }
            for key in 0..50_u64 {
                map.insert(key, key + round).unwrap();
            }
        }
        // Churn at constant live size must not force growth.
        assert_eq!(map.capacity(), capacity);
        for key in 0..50_u64 {
            assert_eq!(map.get(&key), Some(&(key + 19)));
        }
    }
}
