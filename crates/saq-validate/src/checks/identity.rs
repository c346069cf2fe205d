//! Requirement id checks for rows that address an existing requirement.

use saq_model::{RequirementId, RowAction, SaqColumn, SaqRow};

use crate::issue::ContentIssue;

pub fn check(row: &SaqRow, action: RowAction) -> Vec<ContentIssue> {
    if !action.requires_id() {
        return Vec::new();
    }
    let raw = row.trimmed(SaqColumn::PolicyRequirementId);
    if raw.is_empty() {
        return vec![ContentIssue::MissingRequirementId { action }];
    }
    match raw.parse::<RequirementId>() {
        Ok(_) => Vec::new(),
        Err(_) => vec![ContentIssue::InvalidRequirementId {
            value: raw.to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_needs_no_id() {
        assert!(check(&SaqRow::new(0), RowAction::Add).is_empty());
    }

    #[test]
    fn test_delete_needs_positive_id() {
        let row = SaqRow::new(0);
        assert_eq!(
            check(&row, RowAction::Delete),
            vec![ContentIssue::MissingRequirementId {
                action: RowAction::Delete
            }]
        );
        let row = row.with(SaqColumn::PolicyRequirementId, "-4");
        assert_eq!(
            check(&row, RowAction::Update),
            vec![ContentIssue::InvalidRequirementId { value: "-4".into() }]
        );
        let row = SaqRow::new(0).with(SaqColumn::PolicyRequirementId, " 18 ");
        assert!(check(&row, RowAction::Delete).is_empty());
    }
}
