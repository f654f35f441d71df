//! Error types for the chronik engine
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The inactive-kind suppression path is deliberately NOT an error: a kind
//! that is disabled by configuration produces a skipped ingestion outcome,
//! never an `Err`.

use crate::types::ActionId;
use std::io;
use thiserror::Error;

/// Result type alias for chronik operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the chronik engine
#[derive(Debug, Error)]
pub enum Error {
    /// Occurrence references a kind that was never registered.
    /// A programming error upstream; the ingestion wrapper logs and drops it.
    #[error("Unknown action kind: {0}")]
    UnknownKind(String),

    /// Startup-time registration conflict. Fatal for the embedding process.
    #[error("Action kind registered twice: {0}")]
    DuplicateKind(String),

    /// Malformed query specification, rejected before storage access
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Update targeting a record that is not (or no longer) stored
    #[error("Action record not found: {0}")]
    NotFound(ActionId),

    /// Version mismatch (for CAS updates)
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: u64,
        /// Actual version found
        actual: u64,
    },

    /// Transient storage failure; append/update paths retry with backoff
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// I/O error (file operations etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for failures worth retrying with bounded backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_kind() {
        let err = Error::UnknownKind("water-break".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Unknown action kind"));
        assert!(msg.contains("water-break"));
    }

    #[test]
    fn test_error_display_duplicate_kind() {
        let err = Error::DuplicateKind("player-quit".to_string());
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn test_error_display_invalid_query() {
        let err = Error::InvalidQuery("from is after to".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Invalid query"));
        assert!(msg.contains("from is after to"));
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound(ActionId::from_raw(17));
        assert!(err.to_string().contains("#17"));
    }

    #[test]
    fn test_error_display_version_mismatch() {
        let err = Error::VersionMismatch {
            expected: 42,
            actual: 43,
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("43"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::StorageUnavailable("pool exhausted".into()).is_transient());
        assert!(!Error::UnknownKind("x".into()).is_transient());
        assert!(!Error::VersionMismatch {
            expected: 1,
            actual: 2
        }
        .is_transient());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        fn returns_error() -> Result<i32> {
            Err(Error::InvalidQuery("test".to_string()))
        }

        assert_eq!(returns_result().unwrap(), 42);
        assert!(returns_error().is_err());
    }
}
