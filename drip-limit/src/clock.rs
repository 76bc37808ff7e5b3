use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time, in seconds since the clock's epoch.
///
/// Bucket state is derived lazily from the clock at the moment of each
/// call; there is no background timer. All participants sharing one
/// storage identity must use clocks with the same epoch, which for
/// cross-process or cross-host storage means [`SystemClock`].
pub trait Clock: Send + Sync {
    /// Seconds elapsed since the clock's epoch.
    fn now(&self) -> f64;
}

/// Wall clock measured from the UNIX epoch.
///
/// The only valid choice for storage shared beyond a single process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs_f64(),
            // A pre-epoch system clock pins the bucket at its epoch.
            Err(_) => 0.0,
        }
    }
}

/// Monotonic clock measured from an anchor taken at construction.
///
/// Backed by `quanta`, so it is cheap to read and immune to wall-clock
/// adjustments. Only meaningful for process-local storage, since the
/// anchor is not shared.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    clock: quanta::Clock,
    anchor: quanta::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        let clock = quanta::Clock::new();
        let anchor = clock.now();
        Self { clock, anchor }
    }

    /// A clock driven by a [`quanta::Mock`], for deterministic tests.
    ///
    /// `now()` starts at `0.0` and advances only through
    /// [`quanta::Mock::increment`].
    pub fn mock() -> (Self, Arc<quanta::Mock>) {
        let (clock, mock) = quanta::Clock::mock();
        let anchor = clock.now();
        (Self { clock, anchor }, mock)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.clock.now().duration_since(self.anchor).as_secs_f64()
    }
}
