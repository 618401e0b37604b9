pub mod generate;
pub use generate::*;
pub mod hasher;
pub use hasher::*;
