//! Degenerate hashers for driving collision paths deterministically.

use probetable_core::Hasher;
use std::marker::PhantomData;

/// A hasher that maps every key to one constant, forcing every collision path
/// at once. The constant is the construction seed.
#[derive(Debug, Clone, Copy)]
pub struct ConstantHasher<T: Eq> {
    constant: u64,
    key_type: PhantomData<T>,
}

impl<T: Eq> Default for ConstantHasher<T> {
    fn default() -> Self {
        Self {
            constant: 0,
            key_type: PhantomData,
        }
    }
}

impl<T: Eq> Hasher<T> for ConstantHasher<T> {
    type State = u64;

    fn from_seed(seed: u64) -> Self {
        Self {
            constant: seed,
            key_type: PhantomData,
        }
    }
    fn from_state(state: Self::State) -> Self {
        Self::from_seed(state)
    }
    fn state(&self) -> &Self::State {
        &self.constant
    }
    fn hash(&self, _value: &T) -> u64 {
        self.constant
    }
}
