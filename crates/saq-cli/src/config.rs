//! `saq.toml` configuration.
//!
//! Every field is optional; missing fields take the defaults below and
//! command-line flags override whatever the file says.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use saq_core::ArchiveLayout;
use saq_model::SAQ_SHEET_NAME;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaqConfig {
    /// SQLite database file.
    pub database: PathBuf,
    /// Worksheet that carries the questionnaire.
    pub sheet_name: String,
    /// Where fully processed inputs are moved.
    pub success_dir: PathBuf,
    /// Where annotated error workbooks are written.
    pub error_dir: PathBuf,
    /// Default output directory for exports.
    pub export_dir: PathBuf,
    /// Workbook whose first sheet exports are written into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    /// Roll a row back entirely when one of its dependents fails.
    pub atomic_rows: bool,
}

impl Default for SaqConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("saq.db"),
            sheet_name: SAQ_SHEET_NAME.to_string(),
            success_dir: PathBuf::from("saq_success"),
            error_dir: PathBuf::from("saq_error"),
            export_dir: PathBuf::from("export_self_audit"),
            template: None,
            atomic_rows: true,
        }
    }
}

impl SaqConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn archive_layout(&self) -> ArchiveLayout {
        ArchiveLayout::new(self.success_dir.clone(), self.error_dir.clone())
    }
}
