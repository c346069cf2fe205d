//! Primary and secondary answer checks.
//!
//! Answer text is never rejected. Anything but `Yes` is stored as
//! non-compliant, so values outside Yes/No only produce a warning.

use tracing::warn;

use saq_model::{SaqColumn, SaqRow, clean_trigger_response, is_yes_no, secondary_applies};

use crate::issue::ContentIssue;

pub fn check(row: &SaqRow) -> Vec<ContentIssue> {
    warn_unusual_answer(row, SaqColumn::InitialAuditResponse);

    let trigger = row.get(SaqColumn::ResponseForSecondaryAuditQuestion);
    if !secondary_applies(trigger) {
        return Vec::new();
    }

    if !is_yes_no(&clean_trigger_response(trigger)) {
        warn!(
            row = row.sheet_row(),
            trigger = trigger.trim(),
            "secondary trigger is not Yes or No"
        );
    }
    warn_unusual_answer(row, SaqColumn::SecondaryAuditResponse);

    if row.is_blank(SaqColumn::SecondaryAuditQuestion) {
        return vec![ContentIssue::MissingField {
            column: SaqColumn::SecondaryAuditQuestion,
        }];
    }
    Vec::new()
}

fn warn_unusual_answer(row: &SaqRow, column: SaqColumn) {
    let answer = row.trimmed(column);
    if !answer.is_empty() && !is_yes_no(answer) {
        warn!(
            row = row.sheet_row(),
            column = column.header(),
            answer,
            "answer is not Yes or No, recording as non-compliant"
        );
    }
}
