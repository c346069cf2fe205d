//! Storage collaborator interfaces.
//!
//! The ingest path reads reference vocabularies through [`ReferenceCatalog`]
//! and writes through [`RequirementStore`]. The export path reads through
//! [`ExportSource`]. Reference data is loaded through [`ReferenceWriter`].

use saq_model::{
    ComplianceLevel, LocationKey, NamedRef, PolicyCompliance, PolicyRequirement, RequirementId,
    RequirementLicenseType, RequirementPermit, RequirementRecord, RequirementVertical,
    VerticalTechnique,
};

use crate::error::Result;

/// Read-only lookups against the reference vocabularies.
///
/// Name arguments are compared trimmed and ASCII case-insensitive.
pub trait ReferenceCatalog {
    fn find_location(&self, key: &LocationKey) -> Result<Option<i64>>;

    fn find_organization(&self, name: &str) -> Result<Option<i64>>;

    /// Category by name. A category owned by `organization_id` wins over a
    /// global one of the same name.
    fn find_audit_category(&self, name: &str, organization_id: Option<i64>)
    -> Result<Option<i64>>;

    fn find_license_type(&self, name: &str) -> Result<Option<i64>>;

    fn license_type_verticals(&self, license_type_id: i64) -> Result<Vec<NamedRef>>;

    fn license_type_permits(&self, license_type_id: i64) -> Result<Vec<NamedRef>>;

    fn vertical_techniques(&self, license_type_vertical_id: i64) -> Result<Vec<NamedRef>>;
}

/// Mutation primitives used by the requirement mutator and compliance
/// reconciler.
pub trait RequirementStore: ReferenceCatalog {
    fn create_policy_requirement(&mut self, requirement: &PolicyRequirement)
    -> Result<RequirementId>;

    /// Overwrite a requirement. Returns `None` when no row has that id.
    fn update_policy_requirement(
        &mut self,
        id: RequirementId,
        requirement: &PolicyRequirement,
    ) -> Result<Option<RequirementId>>;

    /// Remove a requirement and everything hanging off it. Returns whether a
    /// row existed.
    fn delete_policy_requirement(&mut self, id: RequirementId) -> Result<bool>;

    fn add_requirement_license_type(&mut self, link: &RequirementLicenseType) -> Result<()>;

    /// Link a vertical and return the link id techniques attach to.
    fn add_requirement_vertical(&mut self, link: &RequirementVertical) -> Result<i64>;

    fn add_requirement_permit(&mut self, link: &RequirementPermit) -> Result<()>;

    fn add_vertical_technique(&mut self, link: &VerticalTechnique) -> Result<()>;

    /// Persist a compliance record. A record at the same requirement and
    /// level is overwritten.
    fn create_policy_compliance(&mut self, compliance: &PolicyCompliance) -> Result<i64>;

    /// Remove the record at one level. Returns whether a record existed.
    fn delete_policy_compliance(
        &mut self,
        requirement_id: RequirementId,
        level: ComplianceLevel,
    ) -> Result<bool>;

    /// Existing record matching requirement, question, level and trigger.
    fn find_policy_compliance(&self, compliance: &PolicyCompliance) -> Result<Option<i64>>;

    /// Open a row unit. Returns `false` when the backend has no transactions,
    /// in which case every write commits on its own.
    fn begin_unit(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn commit_unit(&mut self) -> Result<()> {
        Ok(())
    }

    fn rollback_unit(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reads backing the export projector.
pub trait ExportSource: ReferenceCatalog {
    /// Active requirements at a location. With an organization, only that
    /// organization's requirements and the global ones are returned.
    fn requirements_for_location(
        &self,
        location: &LocationKey,
        organization_id: Option<i64>,
    ) -> Result<Vec<RequirementRecord>>;

    /// Compliance records of a requirement, primary level first.
    fn policy_compliances(&self, id: RequirementId) -> Result<Vec<PolicyCompliance>>;

    fn license_type_names(&self, id: RequirementId) -> Result<Vec<String>>;

    fn vertical_names(&self, id: RequirementId) -> Result<Vec<String>>;

    fn permit_names(&self, id: RequirementId) -> Result<Vec<String>>;

    fn technique_names(&self, id: RequirementId) -> Result<Vec<String>>;

    fn organization_name(&self, organization_id: i64) -> Result<Option<String>>;
}

/// Idempotent inserts for reference vocabularies. Each call returns the id
/// of the existing entry when one matches.
pub trait ReferenceWriter: ReferenceCatalog {
    fn insert_location(&mut self, key: &LocationKey) -> Result<i64>;

    fn insert_organization(&mut self, name: &str) -> Result<i64>;

    fn insert_audit_category(&mut self, name: &str, organization_id: Option<i64>) -> Result<i64>;

    fn insert_license_type(&mut self, name: &str) -> Result<i64>;

    fn insert_license_type_vertical(&mut self, license_type_id: i64, name: &str) -> Result<i64>;

    fn insert_license_type_permit(&mut self, license_type_id: i64, name: &str) -> Result<i64>;

    fn insert_vertical_technique(&mut self, license_type_vertical_id: i64, name: &str)
    -> Result<i64>;
}
