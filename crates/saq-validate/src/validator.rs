//! Sheet-level validation entry points.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use saq_ingest::{SheetTable, Workbook, present_columns};
use saq_model::{ISSUES_COLUMN, SAQ_SHEET_NAME, SaqColumn, SaqRow};
use saq_store::{ReferenceCatalog, StoreError};

use crate::checks;
use crate::issue::RowIssues;
use crate::resolve::{ResolveError, resolve_references};

/// Required columns absent from a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required columns: {}", .missing.iter().map(SaqColumn::header).collect::<Vec<_>>().join(", "))]
pub struct ColumnValidationError {
    pub missing: Vec<SaqColumn>,
}

/// Outcome of content validation over every row of a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentReport {
    pub rows_checked: usize,
    pub failures: Vec<RowIssues>,
}

impl ContentReport {
    /// The file passes only if no row failed.
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.failures.iter().map(|row| row.issues.len()).sum()
    }

    pub fn failure_for(&self, index: usize) -> Option<&RowIssues> {
        self.failures.iter().find(|row| row.index == index)
    }
}

/// Validates sheet shape and row content before any mutation.
#[derive(Debug, Clone)]
pub struct SaqValidator {
    sheet_name: String,
}

impl Default for SaqValidator {
    fn default() -> Self {
        Self::new(SAQ_SHEET_NAME)
    }
}

impl SaqValidator {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Name of the sheet to ingest, or `None` when no sheet carries the
    /// expected name. Matching is exact and case-sensitive.
    pub fn check_sheet_name<'a>(&self, workbook: &'a Workbook) -> Option<&'a str> {
        workbook
            .sheet_names()
            .into_iter()
            .find(|name| *name == self.sheet_name)
    }

    /// Confirm every required column is present after header trimming.
    pub fn validate_saq_column(&self, headers: &[String]) -> Result<(), ColumnValidationError> {
        let present = present_columns(headers);
        let missing: Vec<SaqColumn> = SaqColumn::required()
            .filter(|column| !present.contains(column))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ColumnValidationError { missing })
        }
    }

    /// Run per-row checks over every row.
    ///
    /// Reference checks run only when a catalog is supplied, and only for add
    /// and update rows. A storage failure during those checks fails the whole
    /// call rather than being recorded against a row.
    pub fn validate_content(
        &self,
        rows: &[SaqRow],
        catalog: Option<&dyn ReferenceCatalog>,
    ) -> Result<ContentReport, StoreError> {
        let mut report = ContentReport {
            rows_checked: rows.len(),
            failures: Vec::new(),
        };

        for row in rows {
            let Some(action) = row.action() else {
                debug!(row = row.sheet_row(), "no mutation requested, skipping checks");
                continue;
            };
            let mut issues = checks::check_row(row, action);
            if action.writes_requirement()
                && let Some(catalog) = catalog
            {
                match resolve_references(row, catalog) {
                    Ok(_) => {}
                    Err(ResolveError::Unresolved(unresolved)) => issues.extend(unresolved),
                    Err(ResolveError::Store(err)) => return Err(err),
                }
            }
            if !issues.is_empty() {
                warn!(
                    row = row.sheet_row(),
                    issues = issues.len(),
                    "row failed content validation"
                );
                report.failures.push(RowIssues {
                    index: row.index,
                    sheet_row: row.sheet_row(),
                    issues,
                });
            }
        }

        Ok(report)
    }
}

/// Build the error artifact table: the original header plus an `Issues`
/// column, and only the rows that failed.
///
/// `original` must be the untouched copy taken before the `Issues` column was
/// dropped; a stale `Issues` column from a previous run is replaced.
pub fn annotate(original: &SheetTable, report: &ContentReport) -> SheetTable {
    let mut base = original.clone();
    base.drop_column(ISSUES_COLUMN);
    base.fill_missing();

    let mut headers = base.headers.clone();
    headers.push(ISSUES_COLUMN.to_string());
    let mut annotated = SheetTable::new(base.name.clone(), headers);

    for failure in &report.failures {
        let Some(cells) = base.rows.get(failure.index) else {
            continue;
        };
        let mut row = cells.clone();
        row.push(failure.annotation());
        annotated.rows.push(row);
    }
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::ContentIssue;

    fn template_headers() -> Vec<String> {
        SaqColumn::ALL
            .iter()
            .map(|column| format!(" {} ", column.header()))
            .collect()
    }

    #[test]
    fn test_check_sheet_name_is_case_sensitive() {
        let validator = SaqValidator::default();
        let workbook = Workbook::new(vec![SheetTable::new("saqs", vec![])]);
        assert_eq!(validator.check_sheet_name(&workbook), None);
        let workbook = Workbook::new(vec![
            SheetTable::new("Notes", vec![]),
            SheetTable::new("SAQs", vec![]),
        ]);
        assert_eq!(validator.check_sheet_name(&workbook), Some("SAQs"));
    }

    #[test]
    fn test_validate_columns_accepts_padded_template() {
        let validator = SaqValidator::default();
        assert!(validator.validate_saq_column(&template_headers()).is_ok());
    }

    #[test]
    fn test_validate_columns_lists_missing() {
        let validator = SaqValidator::default();
        let headers: Vec<String> = template_headers()
            .into_iter()
            .filter(|h| h.trim() != "Permit" && h.trim() != "Action")
            .collect();
        let err = validator.validate_saq_column(&headers).unwrap_err();
        assert_eq!(err.missing, vec![SaqColumn::Permit, SaqColumn::Action]);
        assert_eq!(err.to_string(), "missing required columns: Permit, Action");
    }

    #[test]
    fn test_content_skips_no_op_rows() {
        let validator = SaqValidator::default();
        let rows = vec![
            SaqRow::new(0),
            SaqRow::new(1).with(SaqColumn::Action, "archive"),
        ];
        let report = validator.validate_content(&rows, None).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.rows_checked, 2);
    }

    #[test]
    fn test_content_collects_all_issues() {
        let validator = SaqValidator::default();
        let rows = vec![
            SaqRow::new(0).with(SaqColumn::Action, "delete"),
            SaqRow::new(1).with(SaqColumn::Action, "ADD"),
        ];
        let report = validator.validate_content(&rows, None).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failure_for(1).map(|f| f.issues.len()), Some(5));
        assert_eq!(report.issue_count(), 6);
    }

    #[test]
    fn test_annotate_keeps_failing_rows_only() {
        let original = SheetTable::new(
            "SAQs",
            vec!["Action".into(), "Issues".into(), "State".into()],
        )
        .with_row(vec!["add".into(), "old".into(), "CA".into()])
        .with_row(vec!["delete".into()]);
        let report = ContentReport {
            rows_checked: 2,
            failures: vec![RowIssues {
                index: 1,
                sheet_row: 3,
                issues: vec![ContentIssue::MissingRequirementId {
                    action: saq_model::RowAction::Delete,
                }],
            }],
        };
        let annotated = annotate(&original, &report);
        assert_eq!(annotated.headers, vec!["Action", "State", "Issues"]);
        assert_eq!(
            annotated.rows,
            vec![vec![
                "delete".to_string(),
                String::new(),
                "delete requires a policy requirement id".to_string()
            ]]
        );
    }
}
