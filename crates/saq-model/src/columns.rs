//! The fixed SAQ template column catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default name of the worksheet carrying the questionnaire.
pub const SAQ_SHEET_NAME: &str = "SAQs";

/// Row annotation column added to error artifacts.
pub const ISSUES_COLUMN: &str = "Issues";

/// A column of the SAQ template, in template (export) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SaqColumn {
    PolicyRequirementId,
    Organization,
    City,
    County,
    State,
    Code,
    Chapter,
    Section,
    Regulation,
    Category,
    QuestionOrder,
    InitialAuditQuestion,
    InitialAuditResponse,
    InitialActionForNonCompliance,
    ResponseForSecondaryAuditQuestion,
    SecondaryAuditQuestion,
    SecondaryAuditResponse,
    SecondaryAuditForNonCompliance,
    UserFacingNote,
    LicenseType,
    Vertical,
    Applicability,
    Permit,
    Technique,
    Action,
}

impl SaqColumn {
    pub const ALL: [SaqColumn; 25] = [
        SaqColumn::PolicyRequirementId,
        SaqColumn::Organization,
        SaqColumn::City,
        SaqColumn::County,
        SaqColumn::State,
        SaqColumn::Code,
        SaqColumn::Chapter,
        SaqColumn::Section,
        SaqColumn::Regulation,
        SaqColumn::Category,
        SaqColumn::QuestionOrder,
        SaqColumn::InitialAuditQuestion,
        SaqColumn::InitialAuditResponse,
        SaqColumn::InitialActionForNonCompliance,
        SaqColumn::ResponseForSecondaryAuditQuestion,
        SaqColumn::SecondaryAuditQuestion,
        SaqColumn::SecondaryAuditResponse,
        SaqColumn::SecondaryAuditForNonCompliance,
        SaqColumn::UserFacingNote,
        SaqColumn::LicenseType,
        SaqColumn::Vertical,
        SaqColumn::Applicability,
        SaqColumn::Permit,
        SaqColumn::Technique,
        SaqColumn::Action,
    ];

    /// Canonical snake_case key used after column renaming.
    pub fn key(&self) -> &'static str {
        match self {
            SaqColumn::PolicyRequirementId => "policy_requirement_id",
            SaqColumn::Organization => "organization",
            SaqColumn::City => "city",
            SaqColumn::County => "county",
            SaqColumn::State => "state",
            SaqColumn::Code => "code",
            SaqColumn::Chapter => "chapter",
            SaqColumn::Section => "section",
            SaqColumn::Regulation => "regulation",
            SaqColumn::Category => "category",
            SaqColumn::QuestionOrder => "question_order",
            SaqColumn::InitialAuditQuestion => "initial_audit_question",
            SaqColumn::InitialAuditResponse => "initial_audit_response",
            SaqColumn::InitialActionForNonCompliance => "initial_action_for_non_compliance",
            SaqColumn::ResponseForSecondaryAuditQuestion => {
                "response_for_secondary_audit_question"
            }
            SaqColumn::SecondaryAuditQuestion => "secondary_audit_question",
            SaqColumn::SecondaryAuditResponse => "secondary_audit_response",
            SaqColumn::SecondaryAuditForNonCompliance => "secondary_audit_for_non_compliance",
            SaqColumn::UserFacingNote => "user_facing_note",
            SaqColumn::LicenseType => "license_type",
            SaqColumn::Vertical => "vertical",
            SaqColumn::Applicability => "recreational_medicinal",
            SaqColumn::Permit => "permit",
            SaqColumn::Technique => "technique",
            SaqColumn::Action => "action",
        }
    }

    /// Header text as it appears in the template workbook.
    pub fn header(&self) -> &'static str {
        match self {
            SaqColumn::PolicyRequirementId => "Policy Requirement ID",
            SaqColumn::Organization => "Client Name",
            SaqColumn::City => "City",
            SaqColumn::County => "County",
            SaqColumn::State => "State",
            SaqColumn::Code => "Code",
            SaqColumn::Chapter => "Chapter",
            SaqColumn::Section => "Section",
            SaqColumn::Regulation => "Regulation",
            SaqColumn::Category => "Category",
            SaqColumn::QuestionOrder => "Question Order",
            SaqColumn::InitialAuditQuestion => "Initial Audit Question",
            SaqColumn::InitialAuditResponse => "Initial Audit Response",
            SaqColumn::InitialActionForNonCompliance => "Initial Action for Non-Compliance",
            SaqColumn::ResponseForSecondaryAuditQuestion => {
                "Response for Secondary Audit Question"
            }
            SaqColumn::SecondaryAuditQuestion => "Secondary Audit Question",
            SaqColumn::SecondaryAuditResponse => "Secondary Audit Response",
            SaqColumn::SecondaryAuditForNonCompliance => "Secondary Audit for Non-Compliance",
            SaqColumn::UserFacingNote => "User Facing Note",
            SaqColumn::LicenseType => "License Type",
            SaqColumn::Vertical => "Vertical",
            SaqColumn::Applicability => "Recreational/Medicinal",
            SaqColumn::Permit => "Permit",
            SaqColumn::Technique => "Technique",
            SaqColumn::Action => "Action",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            SaqColumn::Organization => &["client_name", "organization_name"],
            SaqColumn::Applicability => &["applicability"],
            _ => &[],
        }
    }

    /// Columns the reconciliation logic cannot run without.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            SaqColumn::Action
                | SaqColumn::PolicyRequirementId
                | SaqColumn::InitialAuditQuestion
                | SaqColumn::InitialAuditResponse
                | SaqColumn::InitialActionForNonCompliance
                | SaqColumn::ResponseForSecondaryAuditQuestion
                | SaqColumn::SecondaryAuditQuestion
                | SaqColumn::SecondaryAuditResponse
                | SaqColumn::SecondaryAuditForNonCompliance
                | SaqColumn::Permit
                | SaqColumn::City
                | SaqColumn::County
                | SaqColumn::State
                | SaqColumn::Category
                | SaqColumn::LicenseType
        )
    }

    pub fn required() -> impl Iterator<Item = SaqColumn> {
        Self::ALL.into_iter().filter(SaqColumn::is_required)
    }

    /// Resolve a sheet header to a template column.
    ///
    /// Matches the canonical key, the template header, or a known alias after
    /// normalization, so `" Initial Audit Question "` and
    /// `initial_audit_question` resolve to the same column.
    pub fn from_header(raw: &str) -> Option<SaqColumn> {
        let normalized = normalize_column_key(raw);
        if normalized.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|column| {
            column.key() == normalized
                || normalize_column_key(column.header()) == normalized
                || column.aliases().contains(&normalized.as_str())
        })
    }
}

impl fmt::Display for SaqColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Lower-case a header and collapse every run of non-alphanumeric characters
/// into a single underscore.
pub fn normalize_column_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    key
}
