//! SAQ reconciliation core.
//!
//! Turns validated questionnaire rows into requirement mutations:
//!
//! - [`ComplianceReconciler`] derives the one or two compliance records of a
//!   row and persists or verifies them.
//! - [`RequirementMutator`] applies a row's action and populates the
//!   requirement's dependents.
//! - [`BatchDriver`] validates whole files, applies their rows and archives
//!   them.

pub mod archive;
pub mod driver;
pub mod error;
pub mod mutator;
pub mod reconciler;

pub use archive::{ArchiveLayout, TIMESTAMP_FORMAT, timestamp};
pub use driver::{
    BatchDriver, BatchReport, FileReport, FileStatus, MissingCompliance, RowTotals,
    list_workbooks,
};
pub use error::{BatchError, MutationError, Result};
pub use mutator::{
    DependentKind, DependentStatus, RequirementMutator, RowOutcome, RowStatus, build_requirement,
};
pub use reconciler::{
    ComplianceMode, ComplianceOutcome, ComplianceReconciler, ComplianceRecords,
};
