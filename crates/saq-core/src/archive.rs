//! Where processed files and error artifacts go.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::error::{BatchError, Result};

/// Timestamp format used in archive and error artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub fn timestamp(now: DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Success archive and error artifact directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub success_dir: PathBuf,
    pub error_dir: PathBuf,
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self::new("saq_success", "saq_error")
    }
}

impl ArchiveLayout {
    pub fn new(success_dir: impl Into<PathBuf>, error_dir: impl Into<PathBuf>) -> Self {
        Self {
            success_dir: success_dir.into(),
            error_dir: error_dir.into(),
        }
    }

    /// `<success_dir>/<stem>_SAQ_Id_<timestamp>.<ext>`
    pub fn success_path(&self, source: &Path, stamp: &str) -> PathBuf {
        let ext = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("xlsx");
        self.success_dir
            .join(format!("{}_SAQ_Id_{stamp}.{ext}", file_stem(source)))
    }

    /// `<error_dir>/<stem>_error_<timestamp>.xlsx`
    pub fn error_path(&self, source: &Path, stamp: &str) -> PathBuf {
        self.error_dir
            .join(format!("{}_error_{stamp}.xlsx", file_stem(source)))
    }

    /// Move a fully processed input into the success archive.
    ///
    /// Falls back to copy and remove when a rename is not possible, such as
    /// across filesystems.
    pub fn archive_success(&self, source: &Path, stamp: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.success_dir).map_err(|source_err| BatchError::CreateDir {
            path: self.success_dir.clone(),
            source: source_err,
        })?;
        let target = self.success_path(source, stamp);
        let archive_err = |err: std::io::Error| BatchError::Archive {
            from: source.to_path_buf(),
            to: target.clone(),
            source: err,
        };
        if let Err(rename_err) = std::fs::rename(source, &target) {
            debug!(error = %rename_err, "rename failed, copying instead");
            std::fs::copy(source, &target).map_err(archive_err)?;
            std::fs::remove_file(source).map_err(archive_err)?;
        }
        info!(from = %source.display(), to = %target.display(), "archived input");
        Ok(target)
    }
}

fn file_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "saq".to_string())
}
