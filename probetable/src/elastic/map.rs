//! Implements [`Map`] for [`ElasticMap`].

use super::core::ElasticMap;
use crate::slot::Slot;
use probetable_core::{Hasher, Map, TableError};

impl<K: Eq, V, H: Hasher<K>> ElasticMap<K, V, H> {
    /// Find the key by scanning each level's probe sequence. An *empty* slot
    /// terminates the scan of that level; tombstones do not. A level's scan is
    /// bounded by its size, which dominates every probe index the insert path
    /// can have placed at.
    fn locate(&self, key: &K) -> Option<(usize, usize)> {
        let h = self.hasher.hash(key);
        for lvl in 0..self.levels.len() {
            for j in 0..self.levels[lvl].len() {
                let pos = self.probe_pos(h, lvl, j);
                match &self.levels[lvl][pos] {
                    Slot::Empty => break,
                    slot if slot.holds(key) => return Some((lvl, pos)),
                    _ => {}
                }
            }
        }
        None
    }

    /// First free position among the first `limit` probes of `lvl`.
    fn scan_free(&self, lvl: usize, h: u64, limit: usize) -> Option<usize> {
        for j in 0..limit {
            let pos = self.probe_pos(h, lvl, j);
            if self.levels[lvl][pos].is_free() {
                return Some(pos);
            }
        }
        None
    }

    /// Pick a placement slot for an absent key, or `None` if the chosen
    /// strategies exhausted their scans and the table must grow.
    fn find_slot(&self, h: u64) -> Option<(usize, usize)> {
        let level = self.current_level()?;
        let last = self.levels.len() - 1;

        if level == 0 {
            if let Some(pos) = self.scan_free(0, h, self.probe_budget(0)) {
                return Some((0, pos));
            }
            let size = self.levels[0].len();
            return self.scan_free(0, h, size).map(|pos| (0, pos));
        }
        if level == last {
            let size = self.levels[level].len();
            return self.scan_free(level, h, size).map(|pos| (level, pos));
        }

        let eps = self.free_fraction(level);
        let eps_next = self.free_fraction(level + 1);
        if eps > self.delta / 2.0 && eps_next > 0.25 {
            if let Some(pos) = self.scan_free(level, h, self.probe_budget(level)) {
                return Some((level, pos));
            }
            let size = self.levels[level + 1].len();
            self.scan_free(level + 1, h, size).map(|pos| (level + 1, pos))
        } else if eps <= self.delta / 2.0 {
            let size = self.levels[level + 1].len();
            self.scan_free(level + 1, h, size).map(|pos| (level + 1, pos))
        } else {
            let size = self.levels[level].len();
            self.scan_free(level, h, size).map(|pos| (level, pos))
        }
    }

    /// Insert or overwrite. Infallible: every exhaustion outcome doubles the
    /// budget and retries.
    pub(super) fn upsert(&mut self, key: K, value: V) {
        if let Some((lvl, pos)) = self.locate(&key) {
            if let Slot::Occupied(_, v) = &mut self.levels[lvl][pos] {
                *v = value;
            }
            return;
        }

        let h = self.hasher.hash(&key);
        loop {
            match self.find_slot(h) {
                Some((lvl, pos)) => {
                    self.place(lvl, pos, key, value);
                    return;
                }
                // The hash is seed-stable across growth; retry placement in
                // the rebuilt cascade.
                None => self.grow(),
            }
        }
    }

    /// Double the budget, rebuild the cascade, and reinsert every live entry.
    fn grow(&mut self) {
        self.total *= 2;
        let old_levels = std::mem::take(&mut self.levels);
        self.build_levels();
        self.live = 0;
        for level in old_levels {
            for slot in level {
                if let Slot::Occupied(key, value) = slot {
                    self.upsert(key, value);
                }
            }
        }
    }
}

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for ElasticMap<K, V, H> {
    fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        self.upsert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> Option<&V> {
        let (lvl, pos) = self.locate(key)?;
        match &self.levels[lvl][pos] {
            Slot::Occupied(_, v) => Some(v),
            _ => unreachable!(),
        }
    }

    fn update(&mut self, key: &K, value: V) -> bool {
        match self.locate(key) {
            Some((lvl, pos)) => {
                if let Slot::Occupied(_, v) = &mut self.levels[lvl][pos] {
                    *v = value;
                }
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        match self.locate(key) {
            Some((lvl, pos)) => {
                self.levels[lvl][pos].delete();
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

    fn factory<K: Eq, V, H: Hasher<K>>() -> ElasticMap<K, V, H> {
        ElasticMap::with_seed(16, 0.1, 11).unwrap()
    }

    generate_map_tests!(ElasticMap, XXH3Hasher, factory);

    #[test]
    fn test_level_sizes_halve_and_cover_budget() {
        let map = ElasticMap::<u64, u64, XXH3Hasher<u64>>::new(16, 0.1).unwrap();
        let sizes: Vec<usize> = map.levels.iter().map(|l| l.len()).collect();
        assert_eq!(sizes, vec![8, 4, 2, 1, 1]);
        assert_eq!(sizes.iter().sum::<usize>(), map.capacity());
    }

    #[test]
    fn test_remove_even_keys_stress() {
        let mut map = ElasticMap::<u64, u64, XXH3Hasher<u64>>::new(16, 0.1).unwrap();
        for i in 0..2000_u64 {
            map.insert(i, i).unwrap();
        }
        for i in (0..2000_u64).step_by(2) {
            assert!(map.remove(&i));
        }
        for i in 0..2000_u64 {
            if i % 2 == 0 {
                assert_eq!(map.get(&i), None);
            } else {
                assert_eq!(map.get(&i), Some(&i));
            }
        }
        assert_eq!(map.len(), 1000);
    }

    #[test]
    fn test_invalid_delta_is_rejected() {
        for delta in [0.0, 1.0, 2.0, -0.1] {
            let result = ElasticMap::<u64, u64, XXH3Hasher<u64>>::new(16, delta);
            assert!(matches!(result, Err(TableError::InvalidFreeFraction(_))));
        }
    }

    #[test]
    fn test_probe_budget_is_capped_by_delta() {
        let map = ElasticMap::<u64, u64, XXH3Hasher<u64>>::new(1024, 0.1).unwrap();
        let cap = (1.0_f64 / 0.1).log2().ceil() as usize;
        for lvl in 0..map.levels.len() {
            assert!(map.probe_budget(lvl) >= 1);
            assert!(map.probe_budget(lvl) <= cap);
        }
    }

    #[test]
    fn test_growth_preserves_entries_under_load() {
        let mut map = ElasticMap::<u64, u64, XXH3Hasher<u64>>::new(16, 0.25).unwrap();
        let initial_capacity = map.capacity();
        for i in 0..500_u64 {
            map.insert(i, i * 3).unwrap();
        }
        assert!(map.capacity() > initial_capacity);
        for i in 0..500_u64 {
            assert_eq!(map.get(&i), Some(&(i * 3)));
        }
    }
}
