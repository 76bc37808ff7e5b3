//! # drip-limit
//!
//! `drip-limit` is a token bucket rate limiter whose state can be shared
//! across threads, processes or hosts through a pluggable storage backend.
//!
//! ## Core Philosophy
//!
//! The bucket never stores a token counter. Its whole persisted state is a
//! single `f64` *virtual timestamp*: the instant at which the bucket last
//! held exactly zero tokens. The available count is derived lazily from
//! the clock at the moment of each call, so there are no background
//! refill threads or timers, and advancing the timestamp commutes cleanly
//! under optimistic retry.
//!
//! ## Key Concepts
//!
//! * **Pluggable Storage**: the [`Storage`] trait is the only thing a
//!   backend must implement. Two in-memory reference backends ship with
//!   the crate: [`MemoryStorage`] (exclusive lock) and
//!   [`OptimisticStorage`] (compare-and-swap).
//! * **Matched Mutual Exclusion**: each backend picks the [`Mutex`]
//!   strategy matching its concurrency primitive — hold a lock around the
//!   critical section, or re-run it transparently on a CAS conflict.
//! * **Blocking Convenience**: [`BlockingConsumer`] sleeps and retries a
//!   denied consume, with an optional timeout.
//!
//! ## Example
//!
//! ```rust
//! use drip_limit::{Decision, MemoryStorage, Rate, TokenBucket, Unit};
//!
//! let rate = Rate::new(100, Unit::Second).unwrap();
//! let bucket = TokenBucket::new(10, rate, MemoryStorage::new()).unwrap();
//! bucket.bootstrap(10).unwrap();
//!
//! match bucket.consume(1).unwrap() {
//!     Decision::Granted => { /* request allowed */ }
//!     Decision::Denied { retry_after } => {
//!         println!("try again in {retry_after:?}");
//!     }
//! }
//! ```

use std::time::Duration;

mod bucket;
mod clock;
mod consumer;
mod convert;
mod error;
mod memory;
mod optimistic;
mod rate;
mod storage;

pub mod codec;

pub use bucket::TokenBucket;
pub use clock::{Clock, MonotonicClock, SystemClock};
pub use consumer::BlockingConsumer;
pub use convert::TokenConverter;
pub use error::{Error, StorageError};
pub use memory::MemoryStorage;
pub use optimistic::OptimisticStorage;
pub use rate::{Rate, Unit};
pub use storage::{CasMutex, Fence, LockMutex, Mutex, Scope, Storage, Transaction, WriteOutcome};

/// Outcome of a non-blocking consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The tokens were debited.
    Granted,
    /// Not enough tokens; nothing was debited. `retry_after` is the
    /// minimum wait until the same request could succeed, assuming no
    /// other consumer acts meanwhile.
    Denied { retry_after: Duration },
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted)
    }
}
