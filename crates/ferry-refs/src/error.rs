//! Error types for reference operations.

use ferry_types::ObjectId;
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// The ref, pattern or remote name is malformed.
    #[error("invalid name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A transaction edit expected a different current tip.
    #[error("ref {name} moved: expected {expected}, found {actual}")]
    Stale {
        name: String,
        expected: ObjectId,
        actual: ObjectId,
    },

    /// The same ref appears twice in one transaction.
    #[error("ref {name} edited twice in one transaction")]
    DuplicateEdit { name: String },

    /// Serialization or deserialization failure, or a poisoned lock.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
