//! Per-file batch processing.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use serde::Serialize;
use tracing::{error, info, info_span, warn};

use saq_ingest::{IngestError, SheetTable, Workbook, read_workbook, rename_sheet_columns, write_sheet_table};
use saq_model::{ComplianceLevel, ISSUES_COLUMN, RequirementId, RowAction, SaqRow};
use saq_store::{ReferenceCatalog, RequirementStore};
use saq_validate::{ContentReport, SaqValidator, annotate};

use crate::archive::{ArchiveLayout, timestamp};
use crate::error::{BatchError, Result};
use crate::mutator::{DependentStatus, RequirementMutator, RowOutcome, RowStatus};
use crate::reconciler::{ComplianceMode, ComplianceOutcome};

/// How processing of one file ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Every row was applied (or verified, for a check run).
    Completed,
    MissingSheet { expected: String },
    MissingColumns { missing: Vec<String> },
    InvalidContent { failed_rows: usize },
    /// Pre-check found rows whose compliance records are not stored.
    ComplianceMissing { rows: usize },
    /// An unrecognized storage fault stopped the file mid-way.
    Aborted { row: usize, error: String },
    /// The file could not be read or archived.
    Failed { error: String },
}

/// A row whose compliance records were not found during a pre-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCompliance {
    pub index: usize,
    pub sheet_row: usize,
    pub requirement_id: RequirementId,
    pub level: ComplianceLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub sheet: Option<String>,
    #[serde(flatten)]
    pub status: FileStatus,
    pub rows: Vec<RowOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_compliance: Vec<MissingCompliance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_artifact: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_to: Option<PathBuf>,
}

impl FileReport {
    fn new(file: &Path, status: FileStatus) -> Self {
        Self {
            file: file.to_path_buf(),
            sheet: None,
            status,
            rows: Vec::new(),
            content: None,
            missing_compliance: Vec::new(),
            error_artifact: None,
            archived_to: None,
        }
    }

    pub fn failed(file: &Path, error: impl ToString) -> Self {
        Self::new(
            file,
            FileStatus::Failed {
                error: error.to_string(),
            },
        )
    }

    pub fn passed(&self) -> bool {
        self.status == FileStatus::Completed
    }

    pub fn totals(&self) -> RowTotals {
        RowTotals::from_outcomes(&self.rows)
    }
}

/// Row counts by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowTotals {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub partial: usize,
    pub rolled_back: usize,
    pub not_committed: usize,
}

impl RowTotals {
    pub fn from_outcomes(outcomes: &[RowOutcome]) -> Self {
        let mut totals = Self::default();
        for outcome in outcomes {
            match &outcome.status {
                RowStatus::Committed { dependents, .. } => {
                    match outcome.action {
                        Some(RowAction::Update) => totals.updated += 1,
                        _ => totals.added += 1,
                    }
                    if matches!(dependents, DependentStatus::Partial { .. }) {
                        totals.partial += 1;
                    }
                }
                RowStatus::Deleted { .. } => totals.deleted += 1,
                RowStatus::Skipped { .. } => totals.skipped += 1,
                RowStatus::RolledBack { .. } => totals.rolled_back += 1,
                RowStatus::NotCommitted { .. } => totals.not_committed += 1,
            }
        }
        totals
    }

    pub fn add(&mut self, other: RowTotals) {
        self.added += other.added;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.partial += other.partial;
        self.rolled_back += other.rolled_back;
        self.not_committed += other.not_committed;
    }
}

/// Reports for every file of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn passed(&self) -> bool {
        self.files.iter().all(FileReport::passed)
    }

    pub fn totals(&self) -> RowTotals {
        let mut totals = RowTotals::default();
        for file in &self.files {
            totals.add(file.totals());
        }
        totals
    }
}

/// A sheet that passed every validation step.
struct PreparedSheet {
    rows: Vec<SaqRow>,
}

/// Validates and applies questionnaire files one at a time.
#[derive(Debug)]
pub struct BatchDriver<S> {
    mutator: RequirementMutator<S>,
    validator: SaqValidator,
    archive: ArchiveLayout,
    check_references: bool,
}

impl<S: RequirementStore> BatchDriver<S> {
    pub fn new(mutator: RequirementMutator<S>, validator: SaqValidator, archive: ArchiveLayout) -> Self {
        Self {
            mutator,
            validator,
            archive,
            check_references: true,
        }
    }

    /// Resolve row references during content validation (on by default).
    #[must_use]
    pub fn with_reference_checks(mut self, enabled: bool) -> Self {
        self.check_references = enabled;
        self
    }

    pub fn mutator(&self) -> &RequirementMutator<S> {
        &self.mutator
    }

    pub fn into_mutator(self) -> RequirementMutator<S> {
        self.mutator
    }

    /// Read, validate and apply one file, then archive it.
    ///
    /// The input is archived only when every row was attempted.
    pub fn process_file(&mut self, path: &Path) -> Result<FileReport> {
        let workbook = read_workbook(path)?;
        let mut report = self.process_workbook(path, workbook)?;
        if report.passed() {
            let archived = self.archive.archive_success(path, &timestamp(Local::now()))?;
            report.archived_to = Some(archived);
        }
        Ok(report)
    }

    /// Validate and apply an already loaded workbook. `source` names the
    /// file in reports and error artifacts.
    pub fn process_workbook(&mut self, source: &Path, workbook: Workbook) -> Result<FileReport> {
        let span = info_span!("file", file = %source.display());
        let _guard = span.enter();
        let start = Instant::now();

        let prepared = match self.prepare(source, workbook)? {
            Ok(prepared) => prepared,
            Err(report) => return Ok(report),
        };
        let mut report = FileReport::new(source, FileStatus::Completed);
        report.sheet = Some(self.validator.sheet_name().to_string());

        // =====================================================================
        // Mutation: one row at a time, stopping only on unrecognized faults
        // =====================================================================
        for row in &prepared.rows {
            match self.mutator.apply_row(row) {
                Ok(outcome) => report.rows.push(outcome),
                Err(err) => {
                    error!(error = %err, "aborting file");
                    report.status = FileStatus::Aborted {
                        row: err.row(),
                        error: err.to_string(),
                    };
                    return Ok(report);
                }
            }
        }

        let totals = report.totals();
        info!(
            rows = report.rows.len(),
            added = totals.added,
            updated = totals.updated,
            deleted = totals.deleted,
            not_committed = totals.not_committed,
            duration_ms = start.elapsed().as_millis(),
            "file processed"
        );
        Ok(report)
    }

    /// Run every validation step and verify that the compliance records of
    /// update rows (and of id-carrying rows without an action) are stored.
    /// Never writes to the store.
    pub fn check_workbook(&mut self, source: &Path, workbook: Workbook) -> Result<FileReport> {
        let span = info_span!("check", file = %source.display());
        let _guard = span.enter();

        let prepared = match self.prepare(source, workbook)? {
            Ok(prepared) => prepared,
            Err(report) => return Ok(report),
        };
        let mut report = FileReport::new(source, FileStatus::Completed);
        report.sheet = Some(self.validator.sheet_name().to_string());

        for row in &prepared.rows {
            let verify = match row.action() {
                Some(RowAction::Update) | None => row.requirement_id(),
                Some(_) => None,
            };
            let Some(requirement_id) = verify else {
                continue;
            };
            let (store, reconciler) = self.mutator.parts_mut();
            let outcome = reconciler.reconcile(store, row, requirement_id, ComplianceMode::Verify)?;
            if let ComplianceOutcome::NotFound { level } = outcome {
                warn!(
                    row = row.sheet_row(),
                    requirement_id = %requirement_id,
                    level = level.number(),
                    "compliance record not found"
                );
                report.missing_compliance.push(MissingCompliance {
                    index: row.index,
                    sheet_row: row.sheet_row(),
                    requirement_id,
                    level,
                });
            }
        }

        if !report.missing_compliance.is_empty() {
            report.status = FileStatus::ComplianceMissing {
                rows: report.missing_compliance.len(),
            };
        }
        Ok(report)
    }

    /// Pre-check a file on disk without mutating storage or moving it.
    pub fn check_file(&mut self, path: &Path) -> Result<FileReport> {
        let workbook = read_workbook(path)?;
        self.check_workbook(path, workbook)
    }

    /// Process every `.xlsx` file of a directory in file name order.
    ///
    /// A file that fails to read or archive is reported and the run moves on.
    pub fn process_dir(&mut self, dir: &Path) -> Result<BatchReport> {
        let files = list_workbooks(dir)?;
        info!(dir = %dir.display(), files = files.len(), "processing directory");
        let mut batch = BatchReport::default();
        for path in files {
            match self.process_file(&path) {
                Ok(report) => batch.files.push(report),
                Err(err) => {
                    error!(file = %path.display(), error = %err, "file failed");
                    batch.files.push(FileReport::failed(&path, &err));
                }
            }
        }
        Ok(batch)
    }

    /// Pre-check every `.xlsx` file of a directory in file name order.
    pub fn check_dir(&mut self, dir: &Path) -> Result<BatchReport> {
        let mut batch = BatchReport::default();
        for path in list_workbooks(dir)? {
            match self.check_file(&path) {
                Ok(report) => batch.files.push(report),
                Err(err) => {
                    error!(file = %path.display(), error = %err, "file check failed");
                    batch.files.push(FileReport::failed(&path, &err));
                }
            }
        }
        Ok(batch)
    }

    /// Sheet selection, column validation and content validation.
    ///
    /// The outer error is a file-level fault; the inner `Err` is a finished
    /// report for a file that failed validation.
    fn prepare(
        &self,
        source: &Path,
        workbook: Workbook,
    ) -> Result<std::result::Result<PreparedSheet, FileReport>> {
        // =====================================================================
        // Shape: expected sheet and required columns
        // =====================================================================
        let Some(sheet_name) = self.validator.check_sheet_name(&workbook).map(str::to_string) else {
            error!(expected = %self.validator.sheet_name(), "sheet not found");
            return Ok(Err(FileReport::new(
                source,
                FileStatus::MissingSheet {
                    expected: self.validator.sheet_name().to_string(),
                },
            )));
        };
        let mut sheet = workbook.into_sheet(&sheet_name)?;
        sheet.normalize_headers();

        if let Err(err) = self.validator.validate_saq_column(&sheet.headers) {
            error!(error = %err, "column validation failed");
            let mut report = FileReport::new(
                source,
                FileStatus::MissingColumns {
                    missing: err.missing.iter().map(|c| c.header().to_string()).collect(),
                },
            );
            report.sheet = Some(sheet_name);
            return Ok(Err(report));
        }

        // =====================================================================
        // Content: every row must pass before anything is written
        // =====================================================================
        let original: SheetTable = sheet.clone();
        sheet.drop_column(ISSUES_COLUMN);
        sheet.fill_missing();
        let rows = rename_sheet_columns(&sheet);

        let catalog: Option<&dyn ReferenceCatalog> = if self.check_references {
            Some(self.mutator.store())
        } else {
            None
        };
        let content = self.validator.validate_content(&rows, catalog)?;
        if !content.is_valid() {
            let artifact = self.archive.error_path(source, &timestamp(Local::now()));
            let annotated = annotate(&original, &content);
            let written = write_error_artifact(&artifact, &annotated);
            error!(
                failed_rows = content.failures.len(),
                artifact = %artifact.display(),
                "content validation failed"
            );
            let mut report = FileReport::new(
                source,
                FileStatus::InvalidContent {
                    failed_rows: content.failures.len(),
                },
            );
            report.sheet = Some(sheet_name);
            report.error_artifact = written.then_some(artifact);
            report.content = Some(content);
            return Ok(Err(report));
        }

        info!(rows = rows.len(), "validation passed");
        Ok(Ok(PreparedSheet { rows }))
    }
}

fn write_error_artifact(path: &Path, table: &SheetTable) -> bool {
    match write_sheet_table(path, table) {
        Ok(()) => true,
        Err(err) => {
            error!(error = %err, "failed to write error artifact");
            false
        }
    }
}

/// `.xlsx` files of a directory sorted by file name. Office lock files
/// (`~$name.xlsx`) are ignored.
pub fn list_workbooks(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BatchError::Ingest(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        }));
    }
    let entries = std::fs::read_dir(dir).map_err(|source| BatchError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
        })
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_none_or(|name| !name.starts_with("~$"))
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
