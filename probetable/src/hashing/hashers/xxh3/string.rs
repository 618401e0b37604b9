//! Implements [`Hasher`] for string key types using the XXH3 hash function.

use super::core::{XXH3Hasher, XXH3State};
use probetable_core::Hasher;
use std::marker::PhantomData;
use xxhash_rust::xxh3::xxh3_64_with_seed;

impl Hasher<String> for XXH3Hasher<String> {
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
    fn hash(&self, value: &String) -> u64 {
        xxh3_64_with_seed(value.as_bytes(), self.state.seed)
    }
}

impl Hasher<Vec<u8>> for XXH3Hasher<Vec<u8>> {
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
    fn hash(&self, value: &Vec<u8>) -> u64 {
        xxh3_64_with_seed(value.as_slice(), self.state.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_and_bytes_agree() {
        let s = XXH3Hasher::<String>::from_seed(3);
        let b = XXH3Hasher::<Vec<u8>>::from_seed(3);
        let key = "key12345".to_string();
        assert_eq!(s.hash(&key), b.hash(&key.clone().into_bytes()));
    }

    #[test]
    fn test_empty_string_is_hashable() {
        let s = XXH3Hasher::<String>::from_seed(0);
        let _ = s.hash(&String::new());
    }
}
