use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by bucket operations and the blocking consumer.
///
/// Insufficient tokens is *not* an error; it is reported as
/// [`Decision::Denied`](crate::Decision::Denied). Only precondition
/// violations and backend malfunctions end up here.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A caller-supplied value was unusable (zero capacity, zero rate
    /// amount, zero token request).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// More tokens were requested (or bootstrapped) than the bucket can
    /// ever hold. Signals caller misconfiguration; never retried.
    #[error("{requested} tokens exceed the bucket capacity of {capacity}")]
    CapacityExceeded { requested: u64, capacity: u64 },

    /// The storage backend failed. CAS conflicts are recovered internally
    /// and never surface as this variant.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The blocking consumer's deadline elapsed before enough tokens
    /// became available. Indicates sustained unavailability, not a
    /// backend malfunction.
    #[error("timed out after {timeout:?} waiting for tokens")]
    Timeout { timeout: Duration },
}

/// Failures reported by a [`Storage`](crate::Storage) backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The storage holds no timestamp yet; `bootstrap` must run first.
    #[error("storage was not bootstrapped")]
    NotBootstrapped,

    /// The persisted value could not be decoded.
    #[error("persisted timestamp is corrupted: {0}")]
    Corrupted(String),

    /// Backend I/O failure: connect, read, write or lock acquisition.
    #[error("storage backend failure: {0}")]
    Backend(String),
}
