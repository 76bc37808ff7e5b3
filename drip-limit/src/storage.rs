use std::ops::ControlFlow;

use crate::StorageError;

/// Sharing boundary of a storage backend.
///
/// Selection and documentation only; no runtime behavior depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Visible to one process only.
    Process,
    /// Visible to one session, e.g. one authenticated client.
    Session,
    /// Shared across processes or hosts.
    Global,
}

/// Fencing token carried from a read to the write that depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fence {
    /// Exclusive-lock backends need no token; the mutex already
    /// guarantees the value cannot move underneath the writer.
    None,
    /// Observed version for optimistic backends. A write commits only
    /// if the stored version still matches.
    Version(u64),
}

/// Per-operation transaction context returned by [`Storage::read`].
///
/// Carries the timestamp that was read together with any backend fencing
/// token, and must be handed back to exactly one of [`Storage::write`]
/// or [`Storage::release`], making the read-to-write data dependency
/// explicit instead of hiding it in shared mutex state.
#[derive(Debug, Clone, Copy)]
pub struct Transaction {
    timestamp: f64,
    fence: Fence,
}

impl Transaction {
    pub fn new(timestamp: f64, fence: Fence) -> Self {
        Self { timestamp, fence }
    }

    /// The timestamp observed by the read.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn fence(&self) -> Fence {
        self.fence
    }
}

/// Result of handing a [`Transaction`] back to [`Storage::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Committed,
    /// The fencing token went stale; another writer got there first.
    /// An internal retry signal, not an error.
    Conflict,
}

/// Persistence backend holding one bucket's virtual timestamp.
///
/// Implementations must make [`bootstrap`](Storage::bootstrap) an atomic
/// create-if-absent: concurrent bootstraps may all call it, and exactly
/// one value survives with the others silently discarded.
pub trait Storage: Send + Sync {
    /// The mutual-exclusion strategy matching this backend's
    /// concurrency primitive.
    type Mutex: Mutex;

    fn mutex(&self) -> &Self::Mutex;

    fn scope(&self) -> Scope;

    /// True once a timestamp has been stored.
    fn is_bootstrapped(&self) -> Result<bool, StorageError>;

    /// Stores the initial timestamp if none is present yet.
    fn bootstrap(&self, timestamp: f64) -> Result<(), StorageError>;

    /// Discards the persisted state. Afterwards only
    /// [`is_bootstrapped`](Storage::is_bootstrapped) and
    /// [`bootstrap`](Storage::bootstrap) remain valid.
    fn remove(&self) -> Result<(), StorageError>;

    /// Reads the persisted timestamp, beginning a transaction.
    fn read(&self) -> Result<Transaction, StorageError>;

    /// Persists `timestamp`, ending the transaction.
    fn write(&self, txn: Transaction, timestamp: f64) -> Result<WriteOutcome, StorageError>;

    /// Ends the transaction without a write.
    ///
    /// Backends with compare-and-swap bookkeeping use this to release
    /// the fencing token; others ignore it.
    fn release(&self, txn: Transaction) {
        let _ = txn;
    }
}

/// Runs a critical section with exclusive access to one bucket identity.
///
/// The body reports `Break(result)` when the section completed, or
/// `Continue(())` when an optimistic write conflicted and the whole
/// section must run again against fresh state. Retries are invisible to
/// the caller of [`synchronized`](Mutex::synchronized).
pub trait Mutex: Send + Sync {
    fn synchronized<R>(
        &self,
        body: &mut dyn FnMut() -> Result<ControlFlow<R>, StorageError>,
    ) -> Result<R, StorageError>;
}

/// Pessimistic strategy: the whole critical section runs under an
/// exclusive lock, so its writes can never conflict.
#[derive(Debug, Default)]
pub struct LockMutex {
    lock: parking_lot::Mutex<()>,
}

impl LockMutex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mutex for LockMutex {
    fn synchronized<R>(
        &self,
        body: &mut dyn FnMut() -> Result<ControlFlow<R>, StorageError>,
    ) -> Result<R, StorageError> {
        let _guard = self.lock.lock();
        loop {
            if let ControlFlow::Break(result) = body()? {
                return Ok(result);
            }
        }
    }
}

/// Optimistic strategy: no lock is taken; the section is re-run until
/// its write commits without a conflict.
#[derive(Debug, Default)]
pub struct CasMutex;

impl CasMutex {
    pub fn new() -> Self {
        Self
    }
}

impl Mutex for CasMutex {
    fn synchronized<R>(
        &self,
        body: &mut dyn FnMut() -> Result<ControlFlow<R>, StorageError>,
    ) -> Result<R, StorageError> {
        loop {
            match body()? {
                ControlFlow::Break(result) => return Ok(result),
                ControlFlow::Continue(()) => {
                    tracing::trace!("optimistic write conflicted, re-running critical section");
                    std::hint::spin_loop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_mutex_returns_the_section_result() {
        let mutex = LockMutex::new();
        let mut runs = 0;
        let result = mutex.synchronized(&mut || {
            runs += 1;
            Ok(ControlFlow::Break(42))
        });
        assert_eq!(result, Ok(42));
        assert_eq!(runs, 1);
    }

    #[test]
    fn cas_mutex_reruns_the_section_on_conflict() {
        let mutex = CasMutex::new();
        let mut runs = 0;
        let result = mutex.synchronized(&mut || {
            runs += 1;
            if runs < 3 {
                Ok(ControlFlow::Continue(()))
            } else {
                Ok(ControlFlow::Break("done"))
            }
        });
        assert_eq!(result, Ok("done"));
        assert_eq!(runs, 3);
    }

    #[test]
    fn mutex_propagates_storage_errors() {
        let mutex = CasMutex::new();
        let result: Result<(), _> = mutex.synchronized(&mut || {
            Err(StorageError::Backend("connection lost".into()))
        });
        assert_eq!(result, Err(StorageError::Backend("connection lost".into())));
    }

    #[test]
    fn transaction_exposes_the_observed_state() {
        let txn = Transaction::new(12.5, Fence::Version(7));
        assert_eq!(txn.timestamp(), 12.5);
        assert_eq!(txn.fence(), Fence::Version(7));
    }
}
