use std::ops::ControlFlow;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::convert::TokenConverter;
use crate::storage::{Mutex, Storage, WriteOutcome};
use crate::{Decision, Error, Rate};

/// A token bucket whose state lives in a pluggable [`Storage`] backend.
///
/// The persisted state is a single `f64` virtual timestamp: the point in
/// time at which the bucket would have held exactly zero tokens. The
/// available token count is derived from it lazily, so no counter and no
/// background refill thread exist. Consuming `k` tokens advances the
/// timestamp by `k / tokens_per_second` seconds.
///
/// Nothing is cached between operations; every call re-reads the
/// authoritative state under the storage's mutex, so several buckets
/// (across threads, processes or hosts) may share one storage identity.
///
/// # Examples
///
/// ```rust
/// use drip_limit::{Decision, MemoryStorage, Rate, TokenBucket, Unit};
///
/// let rate = Rate::new(100, Unit::Second).unwrap();
/// let bucket = TokenBucket::new(10, rate, MemoryStorage::new()).unwrap();
/// bucket.bootstrap(10).unwrap();
///
/// assert!(bucket.consume(3).unwrap().is_granted());
/// assert_eq!(bucket.tokens().unwrap(), 7);
/// ```
#[derive(Debug)]
pub struct TokenBucket<S: Storage, C: Clock = SystemClock> {
    capacity: u64,
    rate: Rate,
    converter: TokenConverter,
    storage: S,
    clock: C,
}

impl<S: Storage> TokenBucket<S, SystemClock> {
    /// Creates a bucket holding at most `capacity` tokens, refilled at
    /// `rate`, measured against the UNIX-epoch wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `capacity` is zero.
    pub fn new(capacity: u64, rate: Rate, storage: S) -> Result<Self, Error> {
        Self::with_clock(capacity, rate, storage, SystemClock)
    }
}

impl<S: Storage, C: Clock> TokenBucket<S, C> {
    /// Creates a bucket measured against a custom [`Clock`].
    ///
    /// All participants sharing `storage` must use clocks with the same
    /// epoch.
    pub fn with_clock(capacity: u64, rate: Rate, storage: S, clock: C) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidArgument(
                "capacity must be greater than zero",
            ));
        }
        Ok(Self {
            capacity,
            rate,
            converter: TokenConverter::new(rate),
            storage,
            clock,
        })
    }

    /// Initializes the persisted state with `initial` tokens.
    ///
    /// Runs at most once per storage identity: when many processes start
    /// concurrently and all bootstrap the same shared bucket, the first
    /// write wins and every later call is a silent no-op. Expected to
    /// run once per deployment, not per request, since even the no-op
    /// costs a round trip to check the bootstrap state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if `initial > capacity`, or
    /// [`Error::Storage`] if the backend fails.
    pub fn bootstrap(&self, initial: u64) -> Result<(), Error> {
        if initial > self.capacity {
            return Err(Error::CapacityExceeded {
                requested: initial,
                capacity: self.capacity,
            });
        }
        self.storage.mutex().synchronized(&mut || {
            // Re-check under exclusion so racing bootstraps write once.
            if self.storage.is_bootstrapped()? {
                return Ok(ControlFlow::Break(()));
            }
            let timestamp = self
                .converter
                .tokens_to_timestamp(initial, self.clock.now());
            self.storage.bootstrap(timestamp)?;
            tracing::debug!(initial, "bootstrapped token bucket");
            Ok(ControlFlow::Break(()))
        })?;
        Ok(())
    }

    /// Tries to consume `tokens` from the bucket.
    ///
    /// Never blocks and never fails for "insufficient tokens": that is
    /// the [`Decision::Denied`] result, carrying the minimum wait until
    /// the same request could succeed, assuming no other consumer acts
    /// meanwhile. The wait is advisory, not a reservation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `tokens` is zero,
    /// [`Error::CapacityExceeded`] if `tokens > capacity` (the persisted
    /// state is left untouched), or [`Error::Storage`] if the backend
    /// fails.
    pub fn consume(&self, tokens: u64) -> Result<Decision, Error> {
        if tokens == 0 {
            return Err(Error::InvalidArgument(
                "token amount must be greater than zero",
            ));
        }
        if tokens > self.capacity {
            return Err(Error::CapacityExceeded {
                requested: tokens,
                capacity: self.capacity,
            });
        }

        let decision = self.storage.mutex().synchronized(&mut || {
            let now = self.clock.now();
            let txn = self.storage.read()?;

            // A bucket can never hold more than its capacity: idle time
            // beyond the full point is discarded, not banked. The clamp
            // is only persisted if this attempt commits a write, keeping
            // the denied path read-only.
            let mut timestamp = txn.timestamp();
            let min_timestamp = self.converter.tokens_to_timestamp(self.capacity, now);
            if min_timestamp > timestamp {
                timestamp = min_timestamp;
            }

            let available = self.converter.timestamp_to_tokens(timestamp, now);
            if available < tokens {
                self.storage.release(txn);
                let elapsed = now - timestamp;
                let wait = (self.converter.tokens_to_seconds(tokens) - elapsed).max(0.0);
                return Ok(ControlFlow::Break(Decision::Denied {
                    retry_after: Duration::from_secs_f64(wait),
                }));
            }

            let advanced = timestamp + self.converter.tokens_to_seconds(tokens);
            match self.storage.write(txn, advanced)? {
                WriteOutcome::Committed => Ok(ControlFlow::Break(Decision::Granted)),
                WriteOutcome::Conflict => Ok(ControlFlow::Continue(())),
            }
        })?;

        if let Decision::Denied { retry_after } = decision {
            tracing::debug!(tokens, ?retry_after, "consume denied");
        }
        Ok(decision)
    }

    /// The tokens currently available, clamped into `[0, capacity]`.
    ///
    /// Read-only: goes through the same synchronized path as
    /// [`consume`](TokenBucket::consume) but never writes.
    pub fn tokens(&self) -> Result<u64, Error> {
        let available = self.storage.mutex().synchronized(&mut || {
            let now = self.clock.now();
            let txn = self.storage.read()?;

            let mut timestamp = txn.timestamp();
            let min_timestamp = self.converter.tokens_to_timestamp(self.capacity, now);
            if min_timestamp > timestamp {
                timestamp = min_timestamp;
            }

            let available = self.converter.timestamp_to_tokens(timestamp, now);
            self.storage.release(txn);
            Ok(ControlFlow::Break(available))
        })?;
        Ok(available.min(self.capacity))
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// The backend holding this bucket's state.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
