//! Type-safe enumerations for SAQ values.
//!
//! The questionnaire stores these concepts as free text ("add", "1", "Both").
//! They are parsed once at the spreadsheet boundary and only turned back into
//! text by the storage and export layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Row-level mutation requested by the `Action` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAction {
    Add,
    Update,
    Delete,
}

impl RowAction {
    /// Parse a raw cell value. Surrounding whitespace and case are ignored.
    ///
    /// Returns `None` for empty or unrecognized values.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "add" => Some(Self::Add),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RowAction::Add => "add",
            RowAction::Update => "update",
            RowAction::Delete => "delete",
        }
    }

    /// Add and update rows carry a full requirement and fan out into dependents.
    pub fn writes_requirement(&self) -> bool {
        matches!(self, RowAction::Add | RowAction::Update)
    }

    /// Update and delete rows address an existing requirement by id.
    pub fn requires_id(&self) -> bool {
        matches!(self, RowAction::Update | RowAction::Delete)
    }
}

impl fmt::Display for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compliance question level.
///
/// The secondary question only applies when the primary answer matches the
/// recorded trigger response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplianceLevel {
    Primary,
    Secondary,
}

impl ComplianceLevel {
    /// Storage representation ("1" or "2").
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceLevel::Primary => "1",
            ComplianceLevel::Secondary => "2",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            ComplianceLevel::Primary => 1,
            ComplianceLevel::Secondary => 2,
        }
    }
}

impl fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceLevel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(ComplianceLevel::Primary),
            "2" => Ok(ComplianceLevel::Secondary),
            other => Err(ModelError::InvalidLevel(other.to_string())),
        }
    }
}

/// Which market a requirement applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Applicability {
    #[default]
    Both,
    Recreational,
    Medicinal,
}

impl Applicability {
    /// Spreadsheet label used by the template.
    pub fn label(&self) -> &'static str {
        match self {
            Applicability::Both => "Both",
            Applicability::Recreational => "Recreational",
            Applicability::Medicinal => "Medicinal",
        }
    }

    pub fn recreational(&self) -> bool {
        matches!(self, Applicability::Both | Applicability::Recreational)
    }

    pub fn medicinal(&self) -> bool {
        matches!(self, Applicability::Both | Applicability::Medicinal)
    }

    /// Rebuild from the two stored flags.
    ///
    /// A record with neither flag set is reported as medicinal, matching how
    /// legacy exports labelled such rows.
    pub fn from_flags(recreational: bool, medicinal: bool) -> Self {
        match (recreational, medicinal) {
            (true, true) => Applicability::Both,
            (true, false) => Applicability::Recreational,
            _ => Applicability::Medicinal,
        }
    }

    /// Parse a cell value; an empty cell means `Both`.
    pub fn parse_cell(raw: &str) -> Result<Self, ModelError> {
        if raw.trim().is_empty() {
            return Ok(Applicability::Both);
        }
        raw.parse()
    }
}

impl fmt::Display for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Applicability {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "both" => Ok(Applicability::Both),
            "recreational" => Ok(Applicability::Recreational),
            "medicinal" => Ok(Applicability::Medicinal),
            _ => Err(ModelError::InvalidApplicability(s.to_string())),
        }
    }
}
