//! Hashing schemes and per-type hashers used by the containers.
pub mod common;
pub mod hashers;
pub mod multiply_shift;
