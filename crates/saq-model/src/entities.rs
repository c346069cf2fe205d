//! Relational entities written and read by the ingest and export paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::enums::{Applicability, ComplianceLevel};
use crate::error::ModelError;

/// Storage-assigned policy requirement identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequirementId(i64);

impl RequirementId {
    /// Wrap a storage id. Only positive ids identify a stored row.
    pub fn new(value: i64) -> Result<Self, ModelError> {
        if value <= 0 {
            return Err(ModelError::InvalidRequirementId(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequirementId {
    type Err = ModelError;

    /// Parse a cell value. Spreadsheet readers may render integers as `12.0`,
    /// which is accepted as long as there is no fractional part.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<i64>()
            .ok()
            .or_else(|| {
                trimmed
                    .strip_suffix(".0")
                    .and_then(|whole| whole.parse::<i64>().ok())
            })
            .ok_or_else(|| ModelError::InvalidRequirementId(s.to_string()))?;
        Self::new(value)
    }
}

/// Natural key of a regulation location. Empty parts are stored as empty
/// strings (a state-wide requirement has no city or county).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: String,
    pub state: String,
}

impl LocationKey {
    pub fn new(
        city: impl Into<String>,
        county: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into().trim().to_string(),
            county: county.into().trim().to_string(),
            state: state.into().trim().to_string(),
        }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [self.city.as_str(), self.county.as_str(), self.state.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// A single regulatory obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRequirement {
    pub regulation_location_id: i64,
    pub audit_category_id: i64,
    pub code: String,
    pub chapter: String,
    pub section: String,
    pub regulation: String,
    pub question_order: Option<i64>,
    pub is_active: bool,
    pub applicability: Applicability,
    /// `None` applies the requirement to every organization.
    pub organization_id: Option<i64>,
    pub user_facing_note: String,
}

/// One compliance question attached to a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCompliance {
    pub requirement_id: RequirementId,
    pub question: String,
    pub non_compliant: bool,
    pub action: String,
    pub level: ComplianceLevel,
    /// Primary answer that unlocks a secondary question. Empty at level 1.
    pub trigger_response: String,
}

/// Requirement to license type link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequirementLicenseType {
    pub requirement_id: RequirementId,
    pub license_type_id: i64,
}

/// Requirement to license type vertical link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequirementVertical {
    pub requirement_id: RequirementId,
    pub license_type_vertical_id: i64,
}

/// Requirement to license type permit link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequirementPermit {
    pub requirement_id: RequirementId,
    pub license_type_permit_id: i64,
}

/// Requirement-vertical pair to technique link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerticalTechnique {
    pub policy_requirement_vertical_id: i64,
    pub license_type_vertical_technique_id: i64,
}

/// An id/name pair from a reference vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

impl NamedRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Vocabulary names compare trimmed and ASCII case-insensitive.
    pub fn matches(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

pub fn names_match(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// A stored requirement joined with its location and category, as read by
/// the export path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementRecord {
    pub id: RequirementId,
    pub location: LocationKey,
    pub category: String,
    pub requirement: PolicyRequirement,
}
