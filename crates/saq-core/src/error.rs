//! Error types for the reconciliation core.

use std::path::PathBuf;

use thiserror::Error;

use saq_ingest::IngestError;
use saq_store::StoreError;

/// An unrecognized storage fault while mutating a row. Aborts the file.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("storage fault on sheet row {row}: {source}")]
    Store {
        row: usize,
        #[source]
        source: StoreError,
    },
}

impl MutationError {
    /// Sheet row (1-based, header counted) the fault happened on.
    pub fn row(&self) -> usize {
        match self {
            Self::Store { row, .. } => *row,
        }
    }
}

/// File-level failures of the batch driver.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Storage failed while checking row references.
    #[error("reference check failed: {0}")]
    Store(#[from] StoreError),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to archive {from} to {to}: {source}")]
    Archive {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BatchError>;
