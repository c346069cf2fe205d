//! Tests for loading `saq.toml`.

use std::path::PathBuf;

use saq_cli::config::{ConfigError, SaqConfig};

#[test]
fn test_load_full_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saq.toml");
    std::fs::write(
        &path,
        r#"
database = "db/policy.db"
sheet_name = "Questions"
success_dir = "done"
error_dir = "errors"
export_dir = "out"
template = "template.xlsx"
atomic_rows = false
"#,
    )
    .unwrap();

    let config = SaqConfig::load(&path).unwrap();
    assert_eq!(config.database, PathBuf::from("db/policy.db"));
    assert_eq!(config.sheet_name, "Questions");
    assert_eq!(config.export_dir, PathBuf::from("out"));
    assert_eq!(config.template, Some(PathBuf::from("template.xlsx")));
    assert!(!config.atomic_rows);

    let layout = config.archive_layout();
    assert_eq!(layout.success_dir, PathBuf::from("done"));
    assert_eq!(layout.error_dir, PathBuf::from("errors"));
}

#[test]
fn test_load_or_default_without_path() {
    let config = SaqConfig::load_or_default(None).unwrap();
    assert_eq!(config, SaqConfig::default());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SaqConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_malformed_file_is_toml_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saq.toml");
    std::fs::write(&path, "atomic_rows = \"sometimes\"\n").unwrap();
    let err = SaqConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Toml { .. }));
    assert!(err.to_string().contains("saq.toml"));
}
