//! Custom error types for backup-chain
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for backup chain operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Rejected input (empty file set, empty hybrid policy, unknown rule)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation would break a chain invariant
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Failures reported by a backup algorithm
    #[error("Algorithm error: {0}")]
    Algorithm(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl BackupError {
    /// Create a "not found" error for backups
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for restore points
    pub fn restore_point_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Restore point",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is an invariant violation
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for backup chain operations
pub type BackupResult<T> = Result<T, BackupError>;
