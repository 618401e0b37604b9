//! Hasher based on the XXH3 algorithm.
mod core;
pub use core::*;
mod ints;
mod string;
