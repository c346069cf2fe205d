//! SAQ sheet validation.
//!
//! Runs before any mutation: the expected sheet must exist, every required
//! column must be present, and every row must pass its content checks. Rows
//! that fail are written back out with an `Issues` annotation.

pub mod checks;
pub mod issue;
pub mod resolve;
pub mod validator;

pub use issue::{ContentIssue, RowIssues};
pub use resolve::{ResolveError, ResolvedRow, ResolvedVertical, resolve_references, row_location};
pub use validator::{ColumnValidationError, ContentReport, SaqValidator, annotate};
