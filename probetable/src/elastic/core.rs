//! Declares core types, level geometry, and probe budgets for [`ElasticMap`].

use crate::hashing::common::{reduce, splitmix64, GOLDEN_GAMMA};
use crate::slot::{empty_slots, Slot};
use probetable_core::{Hasher, TableError};

/// A staged table whose level sizes halve geometrically.
///
/// Starting from the full capacity budget, each level takes half of what
/// remains (rounded up), down to single-slot levels. Scans are rationed by a
/// per-level probe budget derived from the level's free fraction `ε` and the
/// configured floor `δ`: the fuller a level is, the more probes a scan may
/// spend, capped at `⌈log₂(1/δ)⌉`. Placement follows a two-level adaptive
/// rule around the first level that still has headroom.
///
/// # Examples
///
/// ```rust
/// use probetable::elastic::ElasticMap;
/// use probetable::hashing::hashers::XXH3Hasher;
/// use probetable::Map;
///
/// let mut map = ElasticMap::<u64, u64, XXH3Hasher<u64>>::new(16, 0.1).unwrap();
/// map.insert(3, 30).unwrap();
/// assert_eq!(map.get(&3), Some(&30));
/// ```
#[derive(Debug)]
pub struct ElasticMap<K: Eq, V, H: Hasher<K>> {
    pub(super) hasher: H,
    pub(super) levels: Vec<Vec<Slot<K, V>>>,
    pub(super) occupied: Vec<usize>,
    pub(super) total: usize,
    pub(super) live: usize,
    pub(super) delta: f64,
}

impl<K: Eq, V, H: Hasher<K>> ElasticMap<K, V, H> {
    pub const DEFAULT_CAPACITY: usize = 16;
    pub const DEFAULT_DELTA: f64 = 0.1;
    pub(super) const MIN_CAPACITY: usize = 16;

    /// Creates a table with the given capacity budget and free-fraction floor.
    ///
    /// Fails with [`TableError::InvalidFreeFraction`] unless `delta ∈ (0, 1)`.
    pub fn new(capacity: usize, delta: f64) -> Result<Self, TableError> {
        Self::with_seed(capacity, delta, 0)
    }

    /// Creates a table with the given capacity budget, free-fraction floor,
    /// and hasher seed.
    pub fn with_seed(capacity: usize, delta: f64, seed: u64) -> Result<Self, TableError> {
        if !(0.0..1.0).contains(&delta) || delta == 0.0 {
            return Err(TableError::InvalidFreeFraction(delta));
        }
        let mut map = Self {
            hasher: H::from_seed(seed),
            levels: Vec::new(),
            occupied: Vec::new(),
            total: capacity.max(Self::MIN_CAPACITY),
            live: 0,
            delta,
        };
        map.build_levels();
        Ok(map)
    }

    /// Carve the budget into halving levels: level `i` takes `⌈C_i/2⌉` of the
    /// remaining `C_i` slots until the budget is exhausted.
    pub(super) fn build_levels(&mut self) {
        let mut sizes = Vec::new();
        let mut remaining = self.total;
        while remaining > 0 {
            let size = remaining.div_ceil(2);
            sizes.push(size);
            remaining -= size;
        }
        self.levels = sizes.iter().map(|&size| empty_slots(size)).collect();
        self.occupied = vec![0; sizes.len()];
    }

    /// The `j`-th probe position of a key at level `lvl`.
    #[inline]
    pub(super) fn probe_pos(&self, h: u64, lvl: usize, j: usize) -> usize {
        let mix = h ^ (h >> ((lvl as u32 + 1) & 63)) ^ (j as u64).wrapping_mul(GOLDEN_GAMMA);
        reduce(splitmix64(mix), self.levels[lvl].len())
    }

    /// Free fraction `ε` of a level.
    #[inline]
    pub(super) fn free_fraction(&self, lvl: usize) -> f64 {
        let size = self.levels[lvl].len() as f64;
        (size - self.occupied[lvl] as f64) / size
    }

    /// Probes a scan of `lvl` may spend: `⌈min(log₂(1/ε), log₂(1/δ))⌉`, at
    /// least 1.
    pub(super) fn probe_budget(&self, lvl: usize) -> usize {
        let cap = (1.0 / self.delta).log2();
        let eps = self.free_fraction(lvl);
        let budget = if eps > 0.0 {
            (1.0 / eps).log2().min(cap)
        } else {
            cap
        };
        budget.ceil().max(1.0) as usize
    }

    /// Occupancy below which a level is considered to still have headroom.
    #[inline]
    pub(super) fn full_target(&self, lvl: usize) -> usize {
        let size = self.levels[lvl].len();
        size - (self.delta * size as f64 / 2.0).floor() as usize
    }

    /// Occupancy below which the next level is considered acceptably empty.
    #[inline]
    pub(super) fn partial_target(&self, lvl: usize) -> usize {
        (0.75 * self.levels[lvl].len() as f64).ceil() as usize
    }

    /// The smallest level that is below its full target, or whose successor is
    /// below its partial target. `None` means every level is saturated.
    pub(super) fn current_level(&self) -> Option<usize> {
        let count = self.levels.len();
        for i in 0..count {
            if self.occupied[i] < self.full_target(i) {
                return Some(i);
            }
            if i + 1 < count && self.occupied[i + 1] < self.partial_target(i + 1) {
                return Some(i);
            }
        }
        None
    }

    pub(super) fn place(&mut self, lvl: usize, pos: usize, key: K, value: V) {
        debug_assert!(self.levels[lvl][pos].is_free());

        self.levels[lvl][pos] = Slot::Occupied(key, value);
        self.occupied[lvl] += 1;
        self.live += 1;
    }
}
