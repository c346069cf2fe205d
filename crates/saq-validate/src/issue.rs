//! Row content issues.
//!
//! Each variant carries only the data needed to describe it. The rendered
//! message is what lands in the `Issues` column of an error artifact.

use std::fmt;

use serde::{Deserialize, Serialize};

use saq_model::{LocationKey, RowAction, SaqColumn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentIssue {
    // Identity
    /// Update or delete row without a requirement id.
    MissingRequirementId { action: RowAction },
    /// Requirement id that is not a positive integer.
    InvalidRequirementId { value: String },

    // Presence and format
    /// Required cell is empty.
    MissingField { column: SaqColumn },
    /// Question order is not an integer.
    InvalidQuestionOrder { value: String },
    /// Applicability is not `Both`, `Recreational` or `Medicinal`.
    InvalidApplicability { value: String },

    // References
    UnknownLocation { location: LocationKey },
    UnknownOrganization { name: String },
    UnknownCategory { name: String },
    UnknownLicenseType { name: String },
    /// Vertical not offered by any listed license type.
    UnknownVertical { name: String },
    /// Permit not offered by any listed license type.
    UnknownPermit { name: String },
    /// Technique not offered by any linked vertical.
    UnknownTechnique { name: String },
}

impl ContentIssue {
    /// Column the issue points at.
    pub fn column(&self) -> SaqColumn {
        match self {
            ContentIssue::MissingRequirementId { .. } | ContentIssue::InvalidRequirementId { .. } => {
                SaqColumn::PolicyRequirementId
            }
            ContentIssue::MissingField { column } => *column,
            ContentIssue::InvalidQuestionOrder { .. } => SaqColumn::QuestionOrder,
            ContentIssue::InvalidApplicability { .. } => SaqColumn::Applicability,
            ContentIssue::UnknownLocation { .. } => SaqColumn::State,
            ContentIssue::UnknownOrganization { .. } => SaqColumn::Organization,
            ContentIssue::UnknownCategory { .. } => SaqColumn::Category,
            ContentIssue::UnknownLicenseType { .. } => SaqColumn::LicenseType,
            ContentIssue::UnknownVertical { .. } => SaqColumn::Vertical,
            ContentIssue::UnknownPermit { .. } => SaqColumn::Permit,
            ContentIssue::UnknownTechnique { .. } => SaqColumn::Technique,
        }
    }

    /// Whether the issue came from a reference lookup rather than the cell
    /// text alone.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            ContentIssue::UnknownLocation { .. }
                | ContentIssue::UnknownOrganization { .. }
                | ContentIssue::UnknownCategory { .. }
                | ContentIssue::UnknownLicenseType { .. }
                | ContentIssue::UnknownVertical { .. }
                | ContentIssue::UnknownPermit { .. }
                | ContentIssue::UnknownTechnique { .. }
        )
    }
}

impl fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentIssue::MissingRequirementId { action } => {
                write!(f, "{action} requires a policy requirement id")
            }
            ContentIssue::InvalidRequirementId { value } => {
                write!(f, "invalid policy requirement id '{value}'")
            }
            ContentIssue::MissingField { column } => write!(f, "{} is required", column.header()),
            ContentIssue::InvalidQuestionOrder { value } => {
                write!(f, "question order must be an integer, found '{value}'")
            }
            ContentIssue::InvalidApplicability { value } => write!(
                f,
                "Recreational/Medicinal must be Both, Recreational or Medicinal, found '{value}'"
            ),
            ContentIssue::UnknownLocation { location } => write!(f, "unknown location '{location}'"),
            ContentIssue::UnknownOrganization { name } => write!(f, "unknown client '{name}'"),
            ContentIssue::UnknownCategory { name } => write!(f, "unknown category '{name}'"),
            ContentIssue::UnknownLicenseType { name } => {
                write!(f, "unknown license type '{name}'")
            }
            ContentIssue::UnknownVertical { name } => {
                write!(f, "vertical '{name}' does not belong to the listed license types")
            }
            ContentIssue::UnknownPermit { name } => {
                write!(f, "permit '{name}' does not belong to the listed license types")
            }
            ContentIssue::UnknownTechnique { name } => {
                write!(f, "technique '{name}' does not belong to the linked verticals")
            }
        }
    }
}

/// All issues found on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssues {
    /// Zero-based data row index.
    pub index: usize,
    /// 1-based row in the source sheet.
    pub sheet_row: usize,
    pub issues: Vec<ContentIssue>,
}

impl RowIssues {
    /// Text written to the `Issues` column.
    pub fn annotation(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_messages() {
        assert_eq!(
            ContentIssue::MissingField {
                column: SaqColumn::InitialAuditQuestion
            }
            .to_string(),
            "Initial Audit Question is required"
        );
        assert_eq!(
            ContentIssue::MissingRequirementId {
                action: RowAction::Delete
            }
            .to_string(),
            "delete requires a policy requirement id"
        );
    }

    #[test]
    fn test_annotation_joins_issues() {
        let row = RowIssues {
            index: 0,
            sheet_row: 2,
            issues: vec![
                ContentIssue::InvalidQuestionOrder {
                    value: "first".into(),
                },
                ContentIssue::UnknownCategory {
                    name: "Safety".into(),
                },
            ],
        };
        assert_eq!(
            row.annotation(),
            "question order must be an integer, found 'first'; unknown category 'Safety'"
        );
    }

    #[test]
    fn test_issue_columns() {
        let issue = ContentIssue::UnknownPermit {
            name: "Events".into(),
        };
        assert_eq!(issue.column(), SaqColumn::Permit);
        assert!(issue.is_reference());
        assert!(
            !ContentIssue::MissingField {
                column: SaqColumn::SecondaryAuditQuestion
            }
            .is_reference()
        );
    }
}
