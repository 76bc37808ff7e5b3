use crate::storage::{Fence, LockMutex, Scope, Storage, Transaction, WriteOutcome};
use crate::StorageError;

/// In-memory storage guarded by an exclusive lock.
///
/// Not shared beyond the owning process; wrap the bucket in an `Arc` to
/// share it among threads. The reference implementation of a
/// [`LockMutex`] backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: parking_lot::Mutex<Option<f64>>,
    mutex: LockMutex,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    type Mutex = LockMutex;

    fn mutex(&self) -> &LockMutex {
        &self.mutex
    }

    fn scope(&self) -> Scope {
        Scope::Process
    }

    fn is_bootstrapped(&self) -> Result<bool, StorageError> {
        Ok(self.slot.lock().is_some())
    }

    fn bootstrap(&self, timestamp: f64) -> Result<(), StorageError> {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = Some(timestamp);
        }
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.slot.lock() = None;
        Ok(())
    }

    fn read(&self) -> Result<Transaction, StorageError> {
        let slot = *self.slot.lock();
        let timestamp = slot.ok_or(StorageError::NotBootstrapped)?;
        Ok(Transaction::new(timestamp, Fence::None))
    }

    fn write(&self, _txn: Transaction, timestamp: f64) -> Result<WriteOutcome, StorageError> {
        *self.slot.lock() = Some(timestamp);
        Ok(WriteOutcome::Committed)
    }
}
