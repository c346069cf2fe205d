//! Presence and format checks on requirement cells.

use saq_model::{Applicability, SaqColumn, SaqRow};

use crate::issue::ContentIssue;

/// Cells an add or update row cannot be written without.
pub const REQUIRED_FOR_WRITE: [SaqColumn; 5] = [
    SaqColumn::State,
    SaqColumn::Category,
    SaqColumn::LicenseType,
    SaqColumn::InitialAuditQuestion,
    SaqColumn::InitialAuditResponse,
];

pub fn check(row: &SaqRow) -> Vec<ContentIssue> {
    let mut issues: Vec<ContentIssue> = REQUIRED_FOR_WRITE
        .into_iter()
        .filter(|column| row.is_blank(*column))
        .map(|column| ContentIssue::MissingField { column })
        .collect();

    let order = row.trimmed(SaqColumn::QuestionOrder);
    if !order.is_empty() && parse_question_order(order).is_none() {
        issues.push(ContentIssue::InvalidQuestionOrder {
            value: order.to_string(),
        });
    }

    let applicability = row.get(SaqColumn::Applicability);
    if Applicability::parse_cell(applicability).is_err() {
        issues.push(ContentIssue::InvalidApplicability {
            value: applicability.trim().to_string(),
        });
    }

    issues
}

/// Parse a question order cell. Integral floats such as `3.0` are accepted.
pub fn parse_question_order(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .strip_suffix(".0")
            .and_then(|whole| whole.parse::<i64>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_row() -> SaqRow {
        SaqRow::new(0)
            .with(SaqColumn::State, "CA")
            .with(SaqColumn::Category, "Security")
            .with(SaqColumn::LicenseType, "Retail")
            .with(SaqColumn::InitialAuditQuestion, "Cameras installed?")
            .with(SaqColumn::InitialAuditResponse, "Yes")
    }

    #[test]
    fn test_complete_row_passes() {
        assert!(check(&complete_row()).is_empty());
    }

    #[test]
    fn test_blank_required_cells() {
        let row = complete_row().with(SaqColumn::Category, "  ");
        assert_eq!(
            check(&row),
            vec![ContentIssue::MissingField {
                column: SaqColumn::Category
            }]
        );
    }

    #[test]
    fn test_question_order_format() {
        assert_eq!(parse_question_order("4"), Some(4));
        assert_eq!(parse_question_order("4.0"), Some(4));
        assert_eq!(parse_question_order("4.5"), None);
        let row = complete_row().with(SaqColumn::QuestionOrder, "first");
        assert_eq!(check(&row).len(), 1);
    }

    #[test]
    fn test_applicability_format() {
        let row = complete_row().with(SaqColumn::Applicability, "MEDICINAL");
        assert!(check(&row).is_empty());
        let row = complete_row().with(SaqColumn::Applicability, "Adult use");
        assert_eq!(
            check(&row),
            vec![ContentIssue::InvalidApplicability {
                value: "Adult use".into()
            }]
        );
    }
}
