//! Hasher based on the multiply-shift hashing scheme.
mod core;
pub use core::*;
mod ints;
