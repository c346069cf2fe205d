//! Row-local content checks. None of these touch storage.

pub mod answers;
pub mod fields;
pub mod identity;

use saq_model::{RowAction, SaqRow};

use crate::issue::ContentIssue;

/// Run every row-local check for a row that carries a mutation.
pub fn check_row(row: &SaqRow, action: RowAction) -> Vec<ContentIssue> {
    let mut issues = identity::check(row, action);
    if action.writes_requirement() {
        issues.extend(fields::check(row));
        issues.extend(answers::check(row));
    }
    issues
}
