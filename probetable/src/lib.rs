pub mod chained;
pub mod cuckoo;
pub mod elastic;
pub mod funnel;
pub mod hashing;
pub mod iceberg;
pub mod linear;
pub mod partitioned;
pub mod perfect;
mod slot;

pub use probetable_core::{Hasher, Map, TableError};
