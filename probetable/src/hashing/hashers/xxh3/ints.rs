//! Implements [`Hasher`] for the integer key types using the XXH3 hash function.

use super::core::{XXH3Hasher, XXH3State};
use probetable_core::Hasher;
use std::marker::PhantomData;
use xxhash_rust::xxh3::xxh3_64_with_seed;

macro_rules! impl_xxh3_int {
    ($($int_type:ty),*) => {
        $(
            impl Hasher<$int_type> for XXH3Hasher<$int_type> {
                type State = XXH3State;

                fn from_seed(seed: u64) -> Self {
                    Self {
                        state: XXH3State::from_seed(seed),
                        key_type: PhantomData,
                    }
                }
                fn from_state(state: Self::State) -> Self {
                    Self {
                        state,
                        key_type: PhantomData,
                    }
                }
                fn state(&self) -> &Self::State {
                    &self.state
                }
                fn hash(&self, value: &$int_type) -> u64 {
                    xxh3_64_with_seed(&value.to_le_bytes(), self.state.seed)
                }
            }
        )*
    };
}

impl_xxh3_int!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_hashes_equally() {
        let a = XXH3Hasher::<u64>::from_seed(42);
        let b = XXH3Hasher::<u64>::from_seed(42);
        for value in [0_u64, 1, 0xdead_beef, u64::MAX] {
            assert_eq!(a.hash(&value), b.hash(&value));
        }
    }

    #[test]
    fn test_seeds_decorrelate() {
        let a = XXH3Hasher::<u64>::from_seed(1);
        let b = XXH3Hasher::<u64>::from_seed(2);
        let diverged = (0_u64..64).any(|v| a.hash(&v) != b.hash(&v));
        assert!(diverged);
    }

    #[test]
    fn test_state_roundtrip() {
        let a = XXH3Hasher::<u32>::from_seed(7);
        let b = XXH3Hasher::<u32>::from_state(*a.state());
        for value in [0_u32, 99, u32::MAX] {
            assert_eq!(a.hash(&value), b.hash(&value));
        }
    }
}
