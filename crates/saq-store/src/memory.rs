//! In-process storage backend.
//!
//! Mirrors the SQLite schema rules (foreign keys, unique link pairs, one
//! compliance record per level, cascading deletes) and records every mutation
//! attempt so tests can assert on exactly which writes happened.

use std::collections::BTreeMap;

use saq_model::{
    Applicability, ComplianceLevel, LocationKey, NamedRef, PolicyCompliance, PolicyRequirement,
    RequirementId, RequirementLicenseType, RequirementPermit, RequirementRecord,
    RequirementVertical, VerticalTechnique, names_match,
};

use crate::error::{Result, StoreError};
use crate::traits::{ExportSource, ReferenceCatalog, ReferenceWriter, RequirementStore};

/// Mutation kinds, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateRequirement,
    UpdateRequirement,
    DeleteRequirement,
    AddLicenseType,
    AddVertical,
    AddPermit,
    AddTechnique,
    CreateCompliance,
    DeleteCompliance,
}

/// One recorded call against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateRequirement(PolicyRequirement),
    UpdateRequirement(RequirementId),
    DeleteRequirement(RequirementId),
    AddLicenseType(RequirementLicenseType),
    AddVertical(RequirementVertical),
    AddPermit(RequirementPermit),
    AddTechnique(VerticalTechnique),
    CreateCompliance(PolicyCompliance),
    DeleteCompliance(RequirementId, ComplianceLevel),
    BeginUnit,
    CommitUnit,
    RollbackUnit,
}

impl StoreCall {
    /// The mutation kind, `None` for unit bookkeeping calls.
    pub fn op(&self) -> Option<StoreOp> {
        match self {
            StoreCall::CreateRequirement(_) => Some(StoreOp::CreateRequirement),
            StoreCall::UpdateRequirement(_) => Some(StoreOp::UpdateRequirement),
            StoreCall::DeleteRequirement(_) => Some(StoreOp::DeleteRequirement),
            StoreCall::AddLicenseType(_) => Some(StoreOp::AddLicenseType),
            StoreCall::AddVertical(_) => Some(StoreOp::AddVertical),
            StoreCall::AddPermit(_) => Some(StoreOp::AddPermit),
            StoreCall::AddTechnique(_) => Some(StoreOp::AddTechnique),
            StoreCall::CreateCompliance(_) => Some(StoreOp::CreateCompliance),
            StoreCall::DeleteCompliance(..) => Some(StoreOp::DeleteCompliance),
            StoreCall::BeginUnit | StoreCall::CommitUnit | StoreCall::RollbackUnit => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CategoryRow {
    id: i64,
    name: String,
    organization_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct ScopedRow {
    id: i64,
    parent_id: i64,
    name: String,
}

impl ScopedRow {
    fn named_ref(&self) -> NamedRef {
        NamedRef::new(self.id, self.name.clone())
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i64,
    locations: Vec<(i64, LocationKey)>,
    organizations: Vec<NamedRef>,
    categories: Vec<CategoryRow>,
    license_types: Vec<NamedRef>,
    verticals: Vec<ScopedRow>,
    permits: Vec<ScopedRow>,
    techniques: Vec<ScopedRow>,
    requirements: BTreeMap<i64, PolicyRequirement>,
    license_type_links: Vec<RequirementLicenseType>,
    vertical_links: Vec<(i64, RequirementVertical)>,
    permit_links: Vec<RequirementPermit>,
    technique_links: Vec<VerticalTechnique>,
    compliances: Vec<(i64, PolicyCompliance)>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_requirement_refs(&self, requirement: &PolicyRequirement) -> Result<()> {
        if !self
            .locations
            .iter()
            .any(|(id, _)| *id == requirement.regulation_location_id)
        {
            return Err(StoreError::constraint(format!(
                "unknown regulation location {}",
                requirement.regulation_location_id
            )));
        }
        if !self
            .categories
            .iter()
            .any(|c| c.id == requirement.audit_category_id)
        {
            return Err(StoreError::constraint(format!(
                "unknown audit category {}",
                requirement.audit_category_id
            )));
        }
        if let Some(org) = requirement.organization_id
            && !self.organizations.iter().any(|o| o.id == org)
        {
            return Err(StoreError::constraint(format!("unknown organization {org}")));
        }
        Ok(())
    }

    fn check_requirement_exists(&self, id: RequirementId) -> Result<()> {
        if self.requirements.contains_key(&id.get()) {
            Ok(())
        } else {
            Err(StoreError::constraint(format!(
                "unknown policy requirement {id}"
            )))
        }
    }
}

/// In-memory [`RequirementStore`] with a call log and failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    snapshot: Option<Tables>,
    transactions: bool,
    calls: Vec<StoreCall>,
    failures: Vec<(StoreOp, StoreError)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable row-unit support.
    #[must_use]
    pub fn with_transactions(mut self, enabled: bool) -> Self {
        self.transactions = enabled;
        self
    }

    /// Make the next call of `op` fail with `error`. Failures queue in order.
    pub fn fail_next(&mut self, op: StoreOp, error: StoreError) {
        self.failures.push((op, error));
    }

    pub fn calls(&self) -> &[StoreCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls of one kind.
    pub fn count(&self, op: StoreOp) -> usize {
        self.calls.iter().filter(|c| c.op() == Some(op)).count()
    }

    /// Number of recorded mutation calls of any kind.
    pub fn mutation_count(&self) -> usize {
        self.calls.iter().filter(|c| c.op().is_some()).count()
    }

    pub fn requirement(&self, id: RequirementId) -> Option<&PolicyRequirement> {
        self.tables.requirements.get(&id.get())
    }

    pub fn requirement_count(&self) -> usize {
        self.tables.requirements.len()
    }

    /// Stored compliance records of a requirement, primary first.
    pub fn compliances(&self, id: RequirementId) -> Vec<PolicyCompliance> {
        let mut records: Vec<PolicyCompliance> = self
            .tables
            .compliances
            .iter()
            .filter(|(_, c)| c.requirement_id == id)
            .map(|(_, c)| c.clone())
            .collect();
        records.sort_by_key(|c| c.level);
        records
    }

    pub fn license_type_links(&self, id: RequirementId) -> Vec<RequirementLicenseType> {
        self.tables
            .license_type_links
            .iter()
            .filter(|l| l.requirement_id == id)
            .copied()
            .collect()
    }

    pub fn vertical_links(&self, id: RequirementId) -> Vec<RequirementVertical> {
        self.tables
            .vertical_links
            .iter()
            .filter(|(_, l)| l.requirement_id == id)
            .map(|(_, l)| *l)
            .collect()
    }

    pub fn permit_links(&self, id: RequirementId) -> Vec<RequirementPermit> {
        self.tables
            .permit_links
            .iter()
            .filter(|l| l.requirement_id == id)
            .copied()
            .collect()
    }

    pub fn technique_link_count(&self) -> usize {
        self.tables.technique_links.len()
    }

    fn record(&mut self, call: StoreCall) -> Result<()> {
        let op = call.op();
        self.calls.push(call);
        if let Some(op) = op
            && let Some(pos) = self.failures.iter().position(|(o, _)| *o == op)
        {
            let (_, error) = self.failures.remove(pos);
            return Err(error);
        }
        Ok(())
    }

    fn vertical_link_ids(&self, id: RequirementId) -> Vec<i64> {
        self.tables
            .vertical_links
            .iter()
            .filter(|(_, l)| l.requirement_id == id)
            .map(|(link_id, _)| *link_id)
            .collect()
    }
}

impl ReferenceCatalog for MemoryStore {
    fn find_location(&self, key: &LocationKey) -> Result<Option<i64>> {
        Ok(self
            .tables
            .locations
            .iter()
            .find(|(_, loc)| {
                names_match(&loc.city, &key.city)
                    && names_match(&loc.county, &key.county)
                    && names_match(&loc.state, &key.state)
            })
            .map(|(id, _)| *id))
    }

    fn find_organization(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .tables
            .organizations
            .iter()
            .find(|o| o.matches(name))
            .map(|o| o.id))
    }

    fn find_audit_category(
        &self,
        name: &str,
        organization_id: Option<i64>,
    ) -> Result<Option<i64>> {
        let named: Vec<&CategoryRow> = self
            .tables
            .categories
            .iter()
            .filter(|c| names_match(&c.name, name))
            .collect();
        let owned = organization_id.and_then(|org| {
            named
                .iter()
                .find(|c| c.organization_id == Some(org))
                .map(|c| c.id)
        });
        Ok(owned.or_else(|| {
            named
                .iter()
                .find(|c| c.organization_id.is_none())
                .map(|c| c.id)
        }))
    }

    fn find_license_type(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .tables
            .license_types
            .iter()
            .find(|l| l.matches(name))
            .map(|l| l.id))
    }

    fn license_type_verticals(&self, license_type_id: i64) -> Result<Vec<NamedRef>> {
        Ok(self
            .tables
            .verticals
            .iter()
            .filter(|v| v.parent_id == license_type_id)
            .map(ScopedRow::named_ref)
            .collect())
    }

    fn license_type_permits(&self, license_type_id: i64) -> Result<Vec<NamedRef>> {
        Ok(self
            .tables
            .permits
            .iter()
            .filter(|p| p.parent_id == license_type_id)
            .map(ScopedRow::named_ref)
            .collect())
    }

    fn vertical_techniques(&self, license_type_vertical_id: i64) -> Result<Vec<NamedRef>> {
        Ok(self
            .tables
            .techniques
            .iter()
            .filter(|t| t.parent_id == license_type_vertical_id)
            .map(ScopedRow::named_ref)
            .collect())
    }
}

impl RequirementStore for MemoryStore {
    fn create_policy_requirement(
        &mut self,
        requirement: &PolicyRequirement,
    ) -> Result<RequirementId> {
        self.record(StoreCall::CreateRequirement(requirement.clone()))?;
        self.tables.check_requirement_refs(requirement)?;
        let id = self.tables.next_id();
        self.tables.requirements.insert(id, requirement.clone());
        Ok(RequirementId::new(id)?)
    }

    fn update_policy_requirement(
        &mut self,
        id: RequirementId,
        requirement: &PolicyRequirement,
    ) -> Result<Option<RequirementId>> {
        self.record(StoreCall::UpdateRequirement(id))?;
        if !self.tables.requirements.contains_key(&id.get()) {
            return Ok(None);
        }
        self.tables.check_requirement_refs(requirement)?;
        self.tables.requirements.insert(id.get(), requirement.clone());
        Ok(Some(id))
    }

    fn delete_policy_requirement(&mut self, id: RequirementId) -> Result<bool> {
        self.record(StoreCall::DeleteRequirement(id))?;
        if self.tables.requirements.remove(&id.get()).is_none() {
            return Ok(false);
        }
        let vertical_link_ids = self.vertical_link_ids(id);
        let tables = &mut self.tables;
        tables.license_type_links.retain(|l| l.requirement_id != id);
        tables.permit_links.retain(|l| l.requirement_id != id);
        tables.vertical_links.retain(|(_, l)| l.requirement_id != id);
        tables
            .technique_links
            .retain(|t| !vertical_link_ids.contains(&t.policy_requirement_vertical_id));
        tables.compliances.retain(|(_, c)| c.requirement_id != id);
        Ok(true)
    }

    fn add_requirement_license_type(&mut self, link: &RequirementLicenseType) -> Result<()> {
        self.record(StoreCall::AddLicenseType(*link))?;
        self.tables.check_requirement_exists(link.requirement_id)?;
        if !self
            .tables
            .license_types
            .iter()
            .any(|l| l.id == link.license_type_id)
        {
            return Err(StoreError::constraint(format!(
                "unknown license type {}",
                link.license_type_id
            )));
        }
        if !self.tables.license_type_links.contains(link) {
            self.tables.license_type_links.push(*link);
        }
        Ok(())
    }

    fn add_requirement_vertical(&mut self, link: &RequirementVertical) -> Result<i64> {
        self.record(StoreCall::AddVertical(*link))?;
        self.tables.check_requirement_exists(link.requirement_id)?;
        if !self
            .tables
            .verticals
            .iter()
            .any(|v| v.id == link.license_type_vertical_id)
        {
            return Err(StoreError::constraint(format!(
                "unknown license type vertical {}",
                link.license_type_vertical_id
            )));
        }
        if let Some((id, _)) = self.tables.vertical_links.iter().find(|(_, l)| l == link) {
            return Ok(*id);
        }
        let id = self.tables.next_id();
        self.tables.vertical_links.push((id, *link));
        Ok(id)
    }

    fn add_requirement_permit(&mut self, link: &RequirementPermit) -> Result<()> {
        self.record(StoreCall::AddPermit(*link))?;
        self.tables.check_requirement_exists(link.requirement_id)?;
        if !self
            .tables
            .permits
            .iter()
            .any(|p| p.id == link.license_type_permit_id)
        {
            return Err(StoreError::constraint(format!(
                "unknown license type permit {}",
                link.license_type_permit_id
            )));
        }
        if !self.tables.permit_links.contains(link) {
            self.tables.permit_links.push(*link);
        }
        Ok(())
    }

    fn add_vertical_technique(&mut self, link: &VerticalTechnique) -> Result<()> {
        self.record(StoreCall::AddTechnique(*link))?;
        if !self
            .tables
            .vertical_links
            .iter()
            .any(|(id, _)| *id == link.policy_requirement_vertical_id)
        {
            return Err(StoreError::constraint(format!(
                "unknown policy requirement vertical {}",
                link.policy_requirement_vertical_id
            )));
        }
        if !self
            .tables
            .techniques
            .iter()
            .any(|t| t.id == link.license_type_vertical_technique_id)
        {
            return Err(StoreError::constraint(format!(
                "unknown vertical technique {}",
                link.license_type_vertical_technique_id
            )));
        }
        if !self.tables.technique_links.contains(link) {
            self.tables.technique_links.push(*link);
        }
        Ok(())
    }

    fn create_policy_compliance(&mut self, compliance: &PolicyCompliance) -> Result<i64> {
        self.record(StoreCall::CreateCompliance(compliance.clone()))?;
        self.tables.check_requirement_exists(compliance.requirement_id)?;
        if let Some((id, existing)) = self.tables.compliances.iter_mut().find(|(_, c)| {
            c.requirement_id == compliance.requirement_id && c.level == compliance.level
        }) {
            *existing = compliance.clone();
            return Ok(*id);
        }
        let id = self.tables.next_id();
        self.tables.compliances.push((id, compliance.clone()));
        Ok(id)
    }

    fn delete_policy_compliance(
        &mut self,
        requirement_id: RequirementId,
        level: ComplianceLevel,
    ) -> Result<bool> {
        self.record(StoreCall::DeleteCompliance(requirement_id, level))?;
        let before = self.tables.compliances.len();
        self.tables
            .compliances
            .retain(|(_, c)| !(c.requirement_id == requirement_id && c.level == level));
        Ok(self.tables.compliances.len() < before)
    }

    fn find_policy_compliance(&self, compliance: &PolicyCompliance) -> Result<Option<i64>> {
        Ok(self
            .tables
            .compliances
            .iter()
            .find(|(_, c)| {
                c.requirement_id == compliance.requirement_id
                    && c.level == compliance.level
                    && c.question == compliance.question
                    && c.trigger_response == compliance.trigger_response
            })
            .map(|(id, _)| *id))
    }

    fn begin_unit(&mut self) -> Result<bool> {
        if !self.transactions {
            return Ok(false);
        }
        self.calls.push(StoreCall::BeginUnit);
        self.snapshot = Some(self.tables.clone());
        Ok(true)
    }

    fn commit_unit(&mut self) -> Result<()> {
        if self.snapshot.take().is_some() {
            self.calls.push(StoreCall::CommitUnit);
        }
        Ok(())
    }

    fn rollback_unit(&mut self) -> Result<()> {
        if let Some(snapshot) = self.snapshot.take() {
            self.calls.push(StoreCall::RollbackUnit);
            // Ids handed out inside the unit are not reused.
            let next_id = self.tables.next_id;
            self.tables = snapshot;
            self.tables.next_id = next_id;
        }
        Ok(())
    }
}

impl ExportSource for MemoryStore {
    fn requirements_for_location(
        &self,
        location: &LocationKey,
        organization_id: Option<i64>,
    ) -> Result<Vec<RequirementRecord>> {
        let Some(location_id) = self.find_location(location)? else {
            return Ok(Vec::new());
        };
        let mut records = Vec::new();
        for (id, requirement) in &self.tables.requirements {
            if requirement.regulation_location_id != location_id || !requirement.is_active {
                continue;
            }
            if let (Some(org), Some(owner)) = (organization_id, requirement.organization_id)
                && org != owner
            {
                continue;
            }
            let category = self
                .tables
                .categories
                .iter()
                .find(|c| c.id == requirement.audit_category_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            let stored_location = self
                .tables
                .locations
                .iter()
                .find(|(lid, _)| *lid == location_id)
                .map(|(_, key)| key.clone())
                .unwrap_or_else(|| location.clone());
            records.push(RequirementRecord {
                id: RequirementId::new(*id)?,
                location: stored_location,
                category,
                requirement: requirement.clone(),
            });
        }
        records.sort_by_key(|r| {
            (
                r.requirement.question_order.is_none(),
                r.requirement.question_order,
                r.id,
            )
        });
        Ok(records)
    }

    fn policy_compliances(&self, id: RequirementId) -> Result<Vec<PolicyCompliance>> {
        Ok(self.compliances(id))
    }

    fn license_type_names(&self, id: RequirementId) -> Result<Vec<String>> {
        Ok(self
            .license_type_links(id)
            .iter()
            .filter_map(|link| {
                self.tables
                    .license_types
                    .iter()
                    .find(|l| l.id == link.license_type_id)
                    .map(|l| l.name.clone())
            })
            .collect())
    }

    fn vertical_names(&self, id: RequirementId) -> Result<Vec<String>> {
        Ok(self
            .vertical_links(id)
            .iter()
            .filter_map(|link| {
                self.tables
                    .verticals
                    .iter()
                    .find(|v| v.id == link.license_type_vertical_id)
                    .map(|v| v.name.clone())
            })
            .collect())
    }

    fn permit_names(&self, id: RequirementId) -> Result<Vec<String>> {
        Ok(self
            .permit_links(id)
            .iter()
            .filter_map(|link| {
                self.tables
                    .permits
                    .iter()
                    .find(|p| p.id == link.license_type_permit_id)
                    .map(|p| p.name.clone())
            })
            .collect())
    }

    fn technique_names(&self, id: RequirementId) -> Result<Vec<String>> {
        let link_ids = self.vertical_link_ids(id);
        let mut names: Vec<String> = Vec::new();
        for link in &self.tables.technique_links {
            if !link_ids.contains(&link.policy_requirement_vertical_id) {
                continue;
            }
            if let Some(technique) = self
                .tables
                .techniques
                .iter()
                .find(|t| t.id == link.license_type_vertical_technique_id)
                && !names.contains(&technique.name)
            {
                names.push(technique.name.clone());
            }
        }
        Ok(names)
    }

    fn organization_name(&self, organization_id: i64) -> Result<Option<String>> {
        Ok(self
            .tables
            .organizations
            .iter()
            .find(|o| o.id == organization_id)
            .map(|o| o.name.clone()))
    }
}

impl ReferenceWriter for MemoryStore {
    fn insert_location(&mut self, key: &LocationKey) -> Result<i64> {
        if let Some(id) = self.find_location(key)? {
            return Ok(id);
        }
        let id = self.tables.next_id();
        let key = LocationKey::new(key.city.clone(), key.county.clone(), key.state.clone());
        self.tables.locations.push((id, key));
        Ok(id)
    }

    fn insert_organization(&mut self, name: &str) -> Result<i64> {
        if let Some(id) = self.find_organization(name)? {
            return Ok(id);
        }
        let id = self.tables.next_id();
        self.tables.organizations.push(NamedRef::new(id, name.trim()));
        Ok(id)
    }

    fn insert_audit_category(&mut self, name: &str, organization_id: Option<i64>) -> Result<i64> {
        if let Some(existing) = self
            .tables
            .categories
            .iter()
            .find(|c| names_match(&c.name, name) && c.organization_id == organization_id)
        {
            return Ok(existing.id);
        }
        let id = self.tables.next_id();
        self.tables.categories.push(CategoryRow {
            id,
            name: name.trim().to_string(),
            organization_id,
        });
        Ok(id)
    }

    fn insert_license_type(&mut self, name: &str) -> Result<i64> {
        if let Some(id) = self.find_license_type(name)? {
            return Ok(id);
        }
        let id = self.tables.next_id();
        self.tables.license_types.push(NamedRef::new(id, name.trim()));
        Ok(id)
    }

    fn insert_license_type_vertical(&mut self, license_type_id: i64, name: &str) -> Result<i64> {
        let id = insert_scoped(&mut self.tables, Scope::Vertical, license_type_id, name);
        Ok(id)
    }

    fn insert_license_type_permit(&mut self, license_type_id: i64, name: &str) -> Result<i64> {
        let id = insert_scoped(&mut self.tables, Scope::Permit, license_type_id, name);
        Ok(id)
    }

    fn insert_vertical_technique(
        &mut self,
        license_type_vertical_id: i64,
        name: &str,
    ) -> Result<i64> {
        let id = insert_scoped(
            &mut self.tables,
            Scope::Technique,
            license_type_vertical_id,
            name,
        );
        Ok(id)
    }
}

#[derive(Clone, Copy)]
enum Scope {
    Vertical,
    Permit,
    Technique,
}

fn insert_scoped(tables: &mut Tables, scope: Scope, parent_id: i64, name: &str) -> i64 {
    let existing = {
        let rows = match scope {
            Scope::Vertical => &tables.verticals,
            Scope::Permit => &tables.permits,
            Scope::Technique => &tables.techniques,
        };
        rows.iter()
            .find(|r| r.parent_id == parent_id && names_match(&r.name, name))
            .map(|r| r.id)
    };
    if let Some(id) = existing {
        return id;
    }
    let id = tables.next_id();
    let row = ScopedRow {
        id,
        parent_id,
        name: name.trim().to_string(),
    };
    match scope {
        Scope::Vertical => tables.verticals.push(row),
        Scope::Permit => tables.permits.push(row),
        Scope::Technique => tables.techniques.push(row),
    }
    id
}

/// An active requirement with every text field empty.
pub fn blank_requirement(location_id: i64, category_id: i64) -> PolicyRequirement {
    PolicyRequirement {
        regulation_location_id: location_id,
        audit_category_id: category_id,
        code: String::new(),
        chapter: String::new(),
        section: String::new(),
        regulation: String::new(),
        question_order: None,
        is_active: true,
        applicability: Applicability::Both,
        organization_id: None,
        user_facing_note: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (MemoryStore, i64, i64, i64) {
        let mut store = MemoryStore::new();
        let loc = store.insert_location(&LocationKey::new("", "", "CA")).unwrap();
        let cat = store.insert_audit_category("Security", None).unwrap();
        let lt = store.insert_license_type("Retail").unwrap();
        (store, loc, cat, lt)
    }

    fn compliance(id: RequirementId, level: ComplianceLevel, question: &str) -> PolicyCompliance {
        PolicyCompliance {
            requirement_id: id,
            question: question.to_string(),
            non_compliant: false,
            action: String::new(),
            level,
            trigger_response: String::new(),
        }
    }

    #[test]
    fn test_create_checks_foreign_keys() {
        let (mut store, loc, cat, _) = seeded();
        let err = store
            .create_policy_requirement(&blank_requirement(999, cat))
            .unwrap_err();
        assert!(err.is_recognized());
        let id = store
            .create_policy_requirement(&blank_requirement(loc, cat))
            .unwrap();
        assert!(store.requirement(id).is_some());
        assert_eq!(store.count(StoreOp::CreateRequirement), 2);
    }

    #[test]
    fn test_delete_cascades() {
        let (mut store, loc, cat, lt) = seeded();
        let vertical = store.insert_license_type_vertical(lt, "Storefront").unwrap();
        let technique = store.insert_vertical_technique(vertical, "Walk-in").unwrap();
        let id = store
            .create_policy_requirement(&blank_requirement(loc, cat))
            .unwrap();
        store
            .add_requirement_license_type(&RequirementLicenseType {
                requirement_id: id,
                license_type_id: lt,
            })
            .unwrap();
        let link = store
            .add_requirement_vertical(&RequirementVertical {
                requirement_id: id,
                license_type_vertical_id: vertical,
            })
            .unwrap();
        store
            .add_vertical_technique(&VerticalTechnique {
                policy_requirement_vertical_id: link,
                license_type_vertical_technique_id: technique,
            })
            .unwrap();
        store
            .create_policy_compliance(&compliance(id, ComplianceLevel::Primary, "Q"))
            .unwrap();

        assert!(store.delete_policy_requirement(id).unwrap());
        assert!(!store.delete_policy_requirement(id).unwrap());
        assert!(store.license_type_links(id).is_empty());
        assert!(store.vertical_links(id).is_empty());
        assert_eq!(store.technique_link_count(), 0);
        assert!(store.compliances(id).is_empty());
    }

    #[test]
    fn test_compliance_upserts_per_level() {
        let (mut store, loc, cat, _) = seeded();
        let id = store
            .create_policy_requirement(&blank_requirement(loc, cat))
            .unwrap();
        let first = store
            .create_policy_compliance(&compliance(id, ComplianceLevel::Primary, "Old"))
            .unwrap();
        let second = store
            .create_policy_compliance(&compliance(id, ComplianceLevel::Primary, "New"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(store.compliances(id).len(), 1);
        assert!(
            store
                .find_policy_compliance(&compliance(id, ComplianceLevel::Primary, "New"))
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_policy_compliance(&compliance(id, ComplianceLevel::Primary, "Old"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_delete_compliance_by_level() {
        let (mut store, loc, cat, _) = seeded();
        let id = store
            .create_policy_requirement(&blank_requirement(loc, cat))
            .unwrap();
        store
            .create_policy_compliance(&compliance(id, ComplianceLevel::Primary, "Q1"))
            .unwrap();
        store
            .create_policy_compliance(&compliance(id, ComplianceLevel::Secondary, "Q2"))
            .unwrap();

        assert!(
            store
                .delete_policy_compliance(id, ComplianceLevel::Secondary)
                .unwrap()
        );
        assert!(
            !store
                .delete_policy_compliance(id, ComplianceLevel::Secondary)
                .unwrap()
        );
        let remaining = store.compliances(id);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].level, ComplianceLevel::Primary);
        assert_eq!(store.count(StoreOp::DeleteCompliance), 2);
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let (mut store, loc, cat, _) = seeded();
        store.fail_next(
            StoreOp::CreateRequirement,
            StoreError::connectivity("down"),
        );
        assert!(
            store
                .create_policy_requirement(&blank_requirement(loc, cat))
                .is_err()
        );
        assert!(
            store
                .create_policy_requirement(&blank_requirement(loc, cat))
                .is_ok()
        );
        assert_eq!(store.requirement_count(), 1);
    }

    #[test]
    fn test_rollback_restores_tables() {
        let (store, loc, cat, _) = seeded();
        let mut store = store.with_transactions(true);
        assert!(store.begin_unit().unwrap());
        store
            .create_policy_requirement(&blank_requirement(loc, cat))
            .unwrap();
        store.rollback_unit().unwrap();
        assert_eq!(store.requirement_count(), 0);
        assert_eq!(store.calls().last(), Some(&StoreCall::RollbackUnit));
    }

    #[test]
    fn test_units_disabled_by_default() {
        let mut store = MemoryStore::new();
        assert!(!store.begin_unit().unwrap());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_category_prefers_organization() {
        let mut store = MemoryStore::new();
        let org = store.insert_organization("Acme").unwrap();
        let global = store.insert_audit_category("Security", None).unwrap();
        let owned = store.insert_audit_category("Security", Some(org)).unwrap();
        assert_eq!(
            store.find_audit_category("security", Some(org)).unwrap(),
            Some(owned)
        );
        assert_eq!(store.find_audit_category("Security", None).unwrap(), Some(global));
        assert_eq!(
            store.find_audit_category("Security", Some(org + 100)).unwrap(),
            Some(global)
        );
    }
}
