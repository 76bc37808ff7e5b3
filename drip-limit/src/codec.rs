//! Byte encoding for backends that persist the timestamp as raw bytes,
//! e.g. files or shared memory segments.
//!
//! The format is exactly 8 bytes: an IEEE-754 double in platform-native
//! byte order. Anything else on read is corruption.

use crate::StorageError;

/// Encodes a timestamp into its 8 byte persisted form.
pub fn pack(timestamp: f64) -> [u8; 8] {
    timestamp.to_ne_bytes()
}

/// Decodes a persisted timestamp.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] unless `bytes` is exactly 8 bytes
/// long.
pub fn unpack(bytes: &[u8]) -> Result<f64, StorageError> {
    let bytes: [u8; 8] = bytes.try_into().map_err(|_| {
        StorageError::Corrupted(format!(
            "persisted timestamp must be 8 bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(f64::from_ne_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_round_trips_timestamps() {
        for timestamp in [0.0, 1.0, -10.5, 1_690_000_000.123_456, f64::MIN, f64::MAX] {
            let packed = pack(timestamp);
            assert_eq!(unpack(&packed), Ok(timestamp));
        }
    }

    #[test]
    fn it_rejects_short_reads() {
        let err = unpack(&[0; 7]).unwrap_err();
        assert!(matches!(err, StorageError::Corrupted(_)));
    }

    #[test]
    fn it_rejects_long_reads() {
        let err = unpack(&[0; 9]).unwrap_err();
        assert!(matches!(err, StorageError::Corrupted(_)));
    }
}
