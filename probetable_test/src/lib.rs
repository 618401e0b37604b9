//! Macro-generated conformance suites for [`Map`] implementations.
//!
//! Invoking [`generate_map_tests!`] inside a container's test module
//! instantiates the universal mapping properties — insert-then-get, overwrite,
//! removal, clearing, growth preservation, size accounting, and a seeded
//! randomized churn — against that container for `u64`, `u32`, and `String`
//! keys. The calling crate must have `compose_idents`, `rand`, `rand_chacha`,
//! and `probetable_testing` available as dev-dependencies.
//!
//! [`Map`]: probetable_core::Map
pub mod map;
