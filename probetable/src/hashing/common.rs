//! Shared mixing primitives.

/// The 64-bit golden-ratio constant, used to decorrelate derived hash streams.
pub const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// The SplitMix64 finalizer from [Steele et al. (2014)].
///
/// The multi-level containers use it to derive per-level and per-probe hash
/// functions from one underlying key hash.
///
/// [Steele et al. (2014)]: https://doi.org/10.1145/2714064.2660195
#[inline]
pub const fn splitmix64(value: u64) -> u64 {
    let mut x = value.wrapping_add(GOLDEN_GAMMA);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Reduce a 64-bit hash to an index in `[0, len)`.
#[inline]
pub(crate) const fn reduce(hash: u64, len: usize) -> usize {
    debug_assert!(len > 0, r#""len" must be greater than 0"#);

    (hash % len as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splitmix64_reference_values() {
        // First outputs of the SplitMix64 stream seeded with 0, per the
        // reference implementation.
        assert_eq!(splitmix64(0), 0xe220a8397b1dcdaf);
        assert_eq!(splitmix64(GOLDEN_GAMMA), 0x6e789e6aa1b965f4);
    }

    #[test]
    fn test_reduce_stays_in_range() {
        for len in [1_usize, 2, 3, 17, 64, 1024] {
            for h in [0_u64, 1, u64::MAX, 0xdead_beef, GOLDEN_GAMMA] {
                assert!(reduce(h, len) < len);
            }
        }
    }
}
