//! Declares core types and the level geometry for [`FunnelMap`].

use crate::hashing::common::{splitmix64, GOLDEN_GAMMA};
use crate::slot::{empty_slots, Slot};
use probetable_core::{Hasher, TableError};

/// A staged table with a cascade of geometrically shrinking primary levels
/// followed by one two-section overflow level.
///
/// Each primary level is viewed as contiguous buckets of `β` slots; an insert
/// greedily takes the first free slot in its bucket on the first level that
/// has one. Entries never move once placed, except on growth. The overflow
/// level combines bounded uniform probing on its first half with a two-choice
/// bucket scheme on its second half.
///
/// Worst-case probe cost per level is the fixed bucket width, giving
/// O(log²(1/δ)) probes over the cascade for a free-fraction parameter `δ`.
///
/// # Examples
///
/// ```rust
/// use probetable::funnel::FunnelMap;
/// use probetable::hashing::hashers::XXH3Hasher;
/// use probetable::Map;
///
/// let mut map = FunnelMap::<u64, u64, XXH3Hasher<u64>>::new(1024, 0.1).unwrap();
/// map.insert(1, 2).unwrap();
/// assert_eq!(map.get(&1), Some(&2));
/// ```
#[derive(Debug)]
pub struct FunnelMap<K: Eq, V, H: Hasher<K>> {
    pub(super) hasher: H,
    /// `alpha` primary levels, then the overflow level at index `alpha`.
    pub(super) levels: Vec<Vec<Slot<K, V>>>,
    pub(super) occupied: Vec<usize>,
    pub(super) total: usize,
    pub(super) live: usize,
    pub(super) delta: f64,
    pub(super) alpha: usize,
    pub(super) beta: usize,
}

/// Attempt count for the uniform section of the overflow level.
pub(super) fn probe_limit(total: usize) -> usize {
    (((total + 2) as f64).log2().log2()).ceil().max(1.0) as usize
}

impl<K: Eq, V, H: Hasher<K>> FunnelMap<K, V, H> {
    pub const DEFAULT_CAPACITY: usize = 1024;
    pub const DEFAULT_DELTA: f64 = 0.1;
    pub(super) const MIN_CAPACITY: usize = 64;

    /// Creates a table with the given capacity budget and free fraction.
    ///
    /// Fails with [`TableError::InvalidFreeFraction`] unless `delta ∈ (0, 1)`.
    pub fn new(capacity: usize, delta: f64) -> Result<Self, TableError> {
        Self::with_seed(capacity, delta, 0)
    }

    /// Creates a table with the given capacity budget, free fraction, and
    /// hasher seed.
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
            alpha: 0,
            beta: 0,
        };
        map.build_levels();
        Ok(map)
    }

    /// Carve the capacity budget into the level cascade.
    ///
    /// Level `i` takes a `0.75^i`-proportional share of the budget left after
    /// reserving `⌈δN/2⌉` for the overflow level, rounded down to a multiple
    /// of `β`; the cascade stops at the first level that would fall below one
    /// bucket, and the overflow level takes everything left.
    pub(super) fn build_levels(&mut self) {
        self.alpha = (4.0 * (1.0 / self.delta).log2() + 10.0).ceil() as usize;
        self.beta = (1.0 / self.delta).log2().ceil().max(1.0) as usize;

        let n = self.total;
        let min_overflow = (self.delta * n as f64 / 2.0).ceil() as usize;
        let rem = n - min_overflow;

        let mut weights = Vec::with_capacity(self.alpha);
        let mut sum = 0.0;
        for i in 0..self.alpha {
            let w = 0.75_f64.powi(i as i32);
            weights.push(w);
            sum += w;
        }

        let mut sizes = Vec::new();
        let mut assigned = 0;
        for w in &weights {
            let mut size = (rem as f64 * w / sum).floor() as usize;
            if size < self.beta {
                break;
            }
            size -= size % self.beta;
            sizes.push(size);
            assigned += size;
        }
        self.alpha = sizes.len();

        let overflow = (n - assigned).max(min_overflow);
        sizes.push(overflow);

        self.levels = sizes.iter().map(|&size| empty_slots(size)).collect();
        self.occupied = vec![0; sizes.len()];
    }

    /// Bucket selector for level `lvl`.
    #[inline]
    pub(super) fn bucket_of(&self, lvl: usize, h: u64) -> u64 {
        splitmix64(h ^ (lvl as u64).wrapping_mul(GOLDEN_GAMMA))
    }

    /// `t`-th independent probe for the uniform overflow section.
    #[inline]
    pub(super) fn probe_at(&self, h: u64, t: usize) -> u64 {
        let a = splitmix64(h ^ self.alpha as u64);
        let b = splitmix64(h ^ t as u64);
        splitmix64(a ^ b)
    }

    pub(super) fn place(&mut self, lvl: usize, idx: usize, key: K, value: V) {
        debug_assert!(self.levels[lvl][idx].is_free());

        self.levels[lvl][idx] = Slot::Occupied(key, value);
        self.occupied[lvl] += 1;
        self.live += 1;
    }
}
