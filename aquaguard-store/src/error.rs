//! Store errors
//!
//! I/O and JSON failures are flattened to strings so the error stays
//! `Clone` and can be logged after the underlying handle is gone.

use aquaguard_core::{ProbeError, SensorKind};
use thiserror_no_std::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Reading, writing or renaming the backing file failed
    #[error("I/O error: {0}")]
    Io(String),

    /// The file is not valid JSON or does not match the record layout
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// The file belongs to another record type
    #[error("Unexpected format {found:?}, expected {expected:?}")]
    WrongFormat {
        found: String,
        expected: &'static str,
    },

    /// Written by a newer (or unknown) schema revision
    #[error("Unsupported {record} version {found}, newest known is {supported}")]
    UnsupportedVersion {
        record: &'static str,
        found: u32,
        supported: u32,
    },

    /// The record was written for another probe type
    #[error("Record belongs to {found:?}, store is bound to {expected:?}")]
    SensorMismatch {
        found: SensorKind,
        expected: SensorKind,
    },
}

impl StoreError {
    /// Short static reason used when crossing into the core error type
    pub fn reason(&self) -> &'static str {
        match self {
            StoreError::Io(_) => "store file I/O failed",
            StoreError::Malformed(_) => "stored record malformed",
            StoreError::WrongFormat { .. } => "unexpected record format",
            StoreError::UnsupportedVersion { .. } => "unsupported record version",
            StoreError::SensorMismatch { .. } => "record belongs to another sensor",
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

impl From<StoreError> for ProbeError {
    fn from(err: StoreError) -> Self {
        ProbeError::Storage {
            reason: err.reason(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_storage_error() {
        let err = StoreError::UnsupportedVersion {
            record: "aquaguard.calibration",
            found: 9,
            supported: 2,
        };
        assert_eq!(
            ProbeError::from(err),
            ProbeError::Storage {
                reason: "unsupported record version"
            }
        );
    }

    #[test]
    fn io_errors_keep_their_message() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume");
        let err = StoreError::from(io);
        assert!(err.to_string().contains("read-only volume"));
    }
}
