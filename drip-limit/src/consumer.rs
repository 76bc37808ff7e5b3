use std::thread;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::storage::Storage;
use crate::{Decision, Error, TokenBucket};

/// Floor for every sleep, so a tiny advisory wait on a fast backend
/// cannot degrade the retry loop into a busy spin.
const MIN_SLEEP: Duration = Duration::from_millis(1);

/// Blocking wrapper around [`TokenBucket::consume`].
///
/// Retries a denied consume after sleeping for the bucket's advisory
/// wait, until the tokens are granted or an optional timeout elapses.
/// Readiness is a pure function of time, so there is no wake-up channel;
/// the consuming thread simply blocks for the computed duration.
///
/// # Examples
///
/// ```rust
/// use drip_limit::{BlockingConsumer, MemoryStorage, Rate, TokenBucket, Unit};
/// use std::time::Duration;
///
/// let rate = Rate::new(100, Unit::Second).unwrap();
/// let bucket = TokenBucket::new(10, rate, MemoryStorage::new()).unwrap();
/// bucket.bootstrap(10).unwrap();
///
/// let consumer = BlockingConsumer::with_timeout(bucket, Duration::from_secs(1));
/// consumer.consume(5).unwrap();
/// ```
#[derive(Debug)]
pub struct BlockingConsumer<S: Storage, C: Clock = SystemClock> {
    bucket: TokenBucket<S, C>,
    timeout: Option<Duration>,
}

impl<S: Storage, C: Clock> BlockingConsumer<S, C> {
    /// A consumer that retries indefinitely.
    pub fn new(bucket: TokenBucket<S, C>) -> Self {
        Self {
            bucket,
            timeout: None,
        }
    }

    /// A consumer that gives up once `timeout` has elapsed.
    ///
    /// A zero timeout polls the bucket exactly once and fails with
    /// [`Error::Timeout`] if the tokens are not immediately available.
    pub fn with_timeout(bucket: TokenBucket<S, C>, timeout: Duration) -> Self {
        Self {
            bucket,
            timeout: Some(timeout),
        }
    }

    /// The wrapped bucket.
    pub fn bucket(&self) -> &TokenBucket<S, C> {
        &self.bucket
    }

    /// Consumes `tokens`, blocking until they are available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] once the deadline has passed without a
    /// grant. Every other error from the bucket — precondition misuse or
    /// a backend failure — propagates immediately without a retry.
    pub fn consume(&self, tokens: u64) -> Result<(), Error> {
        let start = Instant::now();
        loop {
            let retry_after = match self.bucket.consume(tokens)? {
                Decision::Granted => return Ok(()),
                Decision::Denied { retry_after } => retry_after,
            };

            let mut wait = retry_after;
            if let Some(timeout) = self.timeout {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return Err(Error::Timeout { timeout });
                }
                // Never sleep past the deadline; the final poll happens
                // right when it expires.
                wait = wait.min(timeout - elapsed);
            }

            let wait = wait.max(MIN_SLEEP);
            tracing::trace!(tokens, ?wait, "tokens unavailable, sleeping");
            thread::sleep(wait);
        }
    }
}
