//! Error definitions.
use thiserror::Error;

/// Project-wise error type.
#[derive(Error, Debug)]
pub enum TableError {
    /// The free-fraction parameter of a staged table must lie strictly between 0 and 1.
    #[error("free fraction must lie in (0, 1), got {0}")]
    InvalidFreeFraction(f64),

    /// A partitioned bucket could not be assigned collision-free fingerprints within the
    /// bounded number of salt retries.
    #[error("unable to find a collision-free fingerprint assignment for the bucket")]
    FingerprintResolution,

    /// A partitioned bucket hit its hard capacity while growth was unavailable.
    #[error("bucket is full and the table cannot grow at this point")]
    BucketOverflow,
}
