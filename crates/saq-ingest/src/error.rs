//! Error types for SAQ workbook ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing questionnaire workbooks.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Workbook file not found.
    #[error("workbook not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Workbook Errors ===
    /// The workbook could not be opened or parsed.
    #[error("failed to read workbook {path}: {message}")]
    WorkbookRead { path: PathBuf, message: String },

    /// A worksheet could not be read.
    #[error("failed to read sheet '{sheet}' in {path}: {message}")]
    SheetRead {
        path: PathBuf,
        sheet: String,
        message: String,
    },

    /// The requested worksheet does not exist.
    #[error("sheet '{sheet}' not found")]
    SheetNotFound { sheet: String },

    /// Failed to write an output workbook.
    #[error("failed to write workbook {path}: {message}")]
    WorkbookWrite { path: PathBuf, message: String },

    /// Failed to create an output directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
