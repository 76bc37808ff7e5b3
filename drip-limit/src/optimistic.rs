use std::sync::atomic::{AtomicU64, Ordering};

use crate::storage::{CasMutex, Fence, Scope, Storage, Transaction, WriteOutcome};
use crate::StorageError;

/// Bit pattern marking an unbootstrapped cell. It decodes to a NaN, and
/// writes reject non-finite timestamps, so no stored value can collide
/// with it.
const VACANT: u64 = u64::MAX;

/// Lock-free in-memory storage using compare-and-swap.
///
/// The timestamp's bit pattern doubles as the fencing token: a write
/// commits only if the cell still holds the bits the transaction read.
/// Matching bits imply an identical timestamp, so the ABA case is
/// harmless here.
///
/// The reference implementation of a [`CasMutex`] backend; backends with
/// only optimistic concurrency (Redis `WATCH`, memcached `cas`) follow
/// the same transaction protocol.
#[derive(Debug)]
pub struct OptimisticStorage {
    cell: AtomicU64,
    mutex: CasMutex,
}

impl OptimisticStorage {
    pub fn new() -> Self {
        Self {
            cell: AtomicU64::new(VACANT),
            mutex: CasMutex::new(),
        }
    }
}

impl Default for OptimisticStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for OptimisticStorage {
    type Mutex = CasMutex;

    fn mutex(&self) -> &CasMutex {
        &self.mutex
    }

    fn scope(&self) -> Scope {
        Scope::Process
    }

    fn is_bootstrapped(&self) -> Result<bool, StorageError> {
        Ok(self.cell.load(Ordering::Acquire) != VACANT)
    }

    fn bootstrap(&self, timestamp: f64) -> Result<(), StorageError> {
        if !timestamp.is_finite() {
            return Err(StorageError::Corrupted(format!(
                "refusing to store non-finite timestamp {timestamp}"
            )));
        }
        // Create-if-absent: a losing racer's value is discarded.
        let _ = self.cell.compare_exchange(
            VACANT,
            timestamp.to_bits(),
            Ordering::SeqCst,
            Ordering::Acquire,
        );
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        self.cell.store(VACANT, Ordering::Release);
        Ok(())
    }

    fn read(&self) -> Result<Transaction, StorageError> {
        let bits = self.cell.load(Ordering::Acquire);
        if bits == VACANT {
            return Err(StorageError::NotBootstrapped);
        }
        Ok(Transaction::new(f64::from_bits(bits), Fence::Version(bits)))
    }

    fn write(&self, txn: Transaction, timestamp: f64) -> Result<WriteOutcome, StorageError> {
        if !timestamp.is_finite() {
            return Err(StorageError::Corrupted(format!(
                "refusing to store non-finite timestamp {timestamp}"
            )));
        }
        let Fence::Version(expected) = txn.fence() else {
            return Err(StorageError::Backend(
                "write without a fencing token".into(),
            ));
        };
        match self.cell.compare_exchange(
            expected,
            timestamp.to_bits(),
            Ordering::SeqCst,
            Ordering::Acquire,
        ) {
            Ok(_) => Ok(WriteOutcome::Committed),
            Err(_) => Ok(WriteOutcome::Conflict),
        }
    }
}
