//! Per-type hasher implementations.
pub mod msp;
pub mod xxh3;

pub use msp::MSPHasher;
pub use xxh3::XXH3Hasher;
