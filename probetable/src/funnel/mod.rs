//! Funnel hashing: greedy multi-level open addressing without reordering,
//! based on [Farach-Colton et al. (2025)].
//!
//! [Farach-Colton et al. (2025)]: https://doi.org/10.48550/arXiv.2501.02305
mod core;
pub use core::*;
mod map;
