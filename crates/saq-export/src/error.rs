//! Error types for exporting.

use std::path::PathBuf;

use thiserror::Error;

use saq_store::StoreError;

#[derive(Debug, Error)]
pub enum ExportError {
    /// The client name given for the export is not a known organization.
    #[error("unknown organization '{name}'")]
    UnknownOrganization { name: String },

    /// The location has no regulation location entry.
    #[error("unknown location '{location}'")]
    UnknownLocation { location: String },

    #[error("failed to read export data: {0}")]
    Store(#[from] StoreError),

    #[error("failed to read template {path}: {message}")]
    Template { path: PathBuf, message: String },

    #[error("failed to write export {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;
