//! Implements [`Hasher`] for the integer key types using the multiply-shift schemes.

use super::core::{MSPHasher, MSPState};
use crate::hashing::multiply_shift::{multiply_shift, pair_multiply_shift};
use probetable_core::Hasher;
use std::marker::PhantomData;

macro_rules! impl_msp_int_32 {
    ($($int_type:ty),*) => {
        $(
            impl Default for MSPHasher<$int_type> {
                fn default() -> Self {
                    <Self as Hasher<$int_type>>::from_state(MSPState::default())
                }
            }

            impl Hasher<$int_type> for MSPHasher<$int_type> {
                type State = MSPState;

                fn from_seed(seed: u64) -> Self {
                    Self {
                        state: MSPState::from_seed(seed),
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
                    let value = *value as u32;
                    let hi = multiply_shift(value, &self.state.seed_hi_2());
                    let lo = multiply_shift(value, &self.state.seed_lo_2());
                    ((hi as u64) << 32) | lo as u64
                }
            }
        )*
    };
}

impl_msp_int_32!(u8, i8, u16, i16, u32, i32);

macro_rules! impl_msp_int_64 {
    ($($int_type:ty),*) => {
        $(
            impl Default for MSPHasher<$int_type> {
                fn default() -> Self {
                    <Self as Hasher<$int_type>>::from_state(MSPState::default())
                }
            }

            impl Hasher<$int_type> for MSPHasher<$int_type> {
                type State = MSPState;

                fn from_seed(seed: u64) -> Self {
                    Self {
                        state: MSPState::from_seed(seed),
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
                    let value = *value as u64;
                    let hi = pair_multiply_shift(value, &self.state.seed_hi_3());
                    let lo = pair_multiply_shift(value, &self.state.seed_lo_3());
                    ((hi as u64) << 32) | lo as u64
                }
            }
        )*
    };
}

impl_msp_int_64!(u64, i64);
#[cfg(target_pointer_width = "64")]
impl_msp_int_64!(usize, isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_hashes_equally() {
        let a = MSPHasher::<u64>::from_seed(42);
        let b = MSPHasher::<u64>::from_seed(42);
        for value in [0_u64, 1, 0xdead_beef, u64::MAX] {
            assert_eq!(a.hash(&value), b.hash(&value));
        }
    }

    #[test]
    fn test_state_roundtrip() {
        let a = MSPHasher::<u32>::from_seed(7);
        let b = MSPHasher::<u32>::from_state(a.state().clone());
        for value in [0_u32, 99, u32::MAX] {
            assert_eq!(a.hash(&value), b.hash(&value));
        }
    }

    #[test]
    fn test_seeds_decorrelate() {
        let a = MSPHasher::<u64>::from_seed(1);
        let b = MSPHasher::<u64>::from_seed(2);
        let diverged = (0_u64..64).any(|v| a.hash(&v) != b.hash(&v));
        assert!(diverged);
    }
}
