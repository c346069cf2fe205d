//! SAQ data model.
//!
//! Entities of the policy requirement schema, the fixed questionnaire column
//! catalog, and the typed values parsed out of questionnaire cells.

pub mod answers;
pub mod columns;
pub mod entities;
pub mod enums;
pub mod error;
pub mod row;

pub use answers::{
    COMPLIANT_ANSWER, clean_trigger_response, is_yes_no, non_compliant_for, secondary_applies,
    yes_no,
};
pub use columns::{ISSUES_COLUMN, SAQ_SHEET_NAME, SaqColumn, normalize_column_key};
pub use entities::{
    LocationKey, NamedRef, PolicyCompliance, PolicyRequirement, RequirementId,
    RequirementLicenseType, RequirementPermit, RequirementRecord, RequirementVertical,
    VerticalTechnique, names_match,
};
pub use enums::{Applicability, ComplianceLevel, RowAction};
pub use error::{ModelError, Result};
pub use row::SaqRow;
