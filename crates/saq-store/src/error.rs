//! Storage error taxonomy.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors reported by a storage backend.
///
/// Constraint and connectivity failures are *recognized*: a batch logs them,
/// marks the row as not committed and moves on. Anything else aborts the file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness, foreign key or check constraint rejected the write.
    #[error("constraint violation: {message}")]
    Constraint { message: String },

    /// The database could not be reached, opened or locked.
    #[error("storage unavailable: {message}")]
    Connectivity { message: String },

    /// A referenced row does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Reference data file could not be read or parsed.
    #[error("invalid reference data {path}: {message}")]
    ReferenceData { path: PathBuf, message: String },

    /// Any other storage fault.
    #[error("storage error: {message}")]
    Other { message: String },
}

impl StoreError {
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether a batch may continue past this error.
    pub fn is_recognized(&self) -> bool {
        matches!(
            self,
            StoreError::Constraint { .. } | StoreError::Connectivity { .. }
        )
    }

    /// Short kind label for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Constraint { .. } => "constraint",
            StoreError::Connectivity { .. } => "connectivity",
            StoreError::NotFound { .. } => "not_found",
            StoreError::ReferenceData { .. } => "reference_data",
            StoreError::Other { .. } => "other",
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let message = err.to_string();
        match &err {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::ConstraintViolation => StoreError::Constraint { message },
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::SystemIoFailure
                | ErrorCode::PermissionDenied => StoreError::Connectivity { message },
                _ => StoreError::Other { message },
            },
            _ => StoreError::Other { message },
        }
    }
}

impl From<saq_model::ModelError> for StoreError {
    fn from(err: saq_model::ModelError) -> Self {
        StoreError::Other {
            message: err.to_string(),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
