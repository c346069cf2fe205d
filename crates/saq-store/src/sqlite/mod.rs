//! SQLite storage backend.

mod schema;

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use saq_model::{
    Applicability, ComplianceLevel, LocationKey, NamedRef, PolicyCompliance, PolicyRequirement,
    RequirementId, RequirementLicenseType, RequirementPermit, RequirementRecord,
    RequirementVertical, VerticalTechnique, yes_no,
};

use crate::error::{Result, StoreError};
use crate::traits::{ExportSource, ReferenceCatalog, ReferenceWriter, RequirementStore};

pub use schema::SCHEMA;

const UNIT_SAVEPOINT: &str = "saq_row";

/// [`RequirementStore`] over a single SQLite connection.
///
/// Foreign keys are enforced and every dependent table cascades on
/// requirement delete. Row units map onto a savepoint.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    in_unit: bool,
}

impl SqliteStore {
    /// Open or create a database file and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::connectivity(format!("{}: {e}", path.display())))?;
        let store = Self::with_connection(conn)?;
        info!(path = %path.display(), "opened database");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::connectivity(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            in_unit: false,
        })
    }

    /// Underlying connection, for ad-hoc reads.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn compliance_id(&self, id: RequirementId, level: ComplianceLevel) -> Result<i64> {
        let compliance_id = self.conn.query_row(
            "SELECT policy_compliance_id FROM policy_compliance
             WHERE policy_requirement_id = ?1 AND level = ?2",
            params![id.get(), level.as_str()],
            |row| row.get(0),
        )?;
        Ok(compliance_id)
    }

    fn names(&self, sql: &str, id: RequirementId) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let names = stmt
            .query_map(params![id.get()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    fn named_refs(&self, sql: &str, parent_id: i64) -> Result<Vec<NamedRef>> {
        let mut stmt = self.conn.prepare(sql)?;
        let refs = stmt
            .query_map(params![parent_id], |row| {
                Ok(NamedRef::new(row.get(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(refs)
    }

    fn scalar_id(&self, sql: &str, params: impl rusqlite::Params) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(sql, params, |row| row.get(0))
            .optional()?;
        Ok(id)
    }
}

impl ReferenceCatalog for SqliteStore {
    fn find_location(&self, key: &LocationKey) -> Result<Option<i64>> {
        self.scalar_id(
            "SELECT regulation_location_id FROM regulation_location
             WHERE city = ?1 AND county = ?2 AND state = ?3",
            params![key.city.trim(), key.county.trim(), key.state.trim()],
        )
    }

    fn find_organization(&self, name: &str) -> Result<Option<i64>> {
        self.scalar_id(
            "SELECT organization_id FROM organization WHERE name = ?1",
            params![name.trim()],
        )
    }

    fn find_audit_category(
        &self,
        name: &str,
        organization_id: Option<i64>,
    ) -> Result<Option<i64>> {
        self.scalar_id(
            "SELECT audit_category_id FROM audit_category
             WHERE category = ?1 AND (organization_id IS NULL OR organization_id = ?2)
             ORDER BY organization_id IS NULL, audit_category_id
             LIMIT 1",
            params![name.trim(), organization_id],
        )
    }

    fn find_license_type(&self, name: &str) -> Result<Option<i64>> {
        self.scalar_id(
            "SELECT license_type_id FROM license_type WHERE name = ?1",
            params![name.trim()],
        )
    }

    fn license_type_verticals(&self, license_type_id: i64) -> Result<Vec<NamedRef>> {
        self.named_refs(
            "SELECT license_type_vertical_id, name FROM license_type_vertical
             WHERE license_type_id = ?1 ORDER BY license_type_vertical_id",
            license_type_id,
        )
    }

    fn license_type_permits(&self, license_type_id: i64) -> Result<Vec<NamedRef>> {
        self.named_refs(
            "SELECT license_type_permit_id, name FROM license_type_permit
             WHERE license_type_id = ?1 ORDER BY license_type_permit_id",
            license_type_id,
        )
    }

    fn vertical_techniques(&self, license_type_vertical_id: i64) -> Result<Vec<NamedRef>> {
        self.named_refs(
            "SELECT license_type_vertical_technique_id, name FROM license_type_vertical_technique
             WHERE license_type_vertical_id = ?1 ORDER BY license_type_vertical_technique_id",
            license_type_vertical_id,
        )
    }
}

impl RequirementStore for SqliteStore {
    fn create_policy_requirement(
        &mut self,
        requirement: &PolicyRequirement,
    ) -> Result<RequirementId> {
        self.conn.execute(
            "INSERT INTO policy_requirement (
                regulation_location_id, audit_category_id, code, chapter, section,
                regulation, question_order, is_active, recreational, medicinal,
                organization_id, user_facing_note
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                requirement.regulation_location_id,
                requirement.audit_category_id,
                requirement.code,
                requirement.chapter,
                requirement.section,
                requirement.regulation,
                requirement.question_order,
                requirement.is_active,
                requirement.applicability.recreational(),
                requirement.applicability.medicinal(),
                requirement.organization_id,
                requirement.user_facing_note,
            ],
        )?;
        let id = RequirementId::new(self.conn.last_insert_rowid())?;
        debug!(requirement_id = %id, "inserted policy requirement");
        Ok(id)
    }

    fn update_policy_requirement(
        &mut self,
        id: RequirementId,
        requirement: &PolicyRequirement,
    ) -> Result<Option<RequirementId>> {
        let changed = self.conn.execute(
            "UPDATE policy_requirement SET
                regulation_location_id = ?1, audit_category_id = ?2, code = ?3,
                chapter = ?4, section = ?5, regulation = ?6, question_order = ?7,
                is_active = ?8, recreational = ?9, medicinal = ?10,
                organization_id = ?11, user_facing_note = ?12
             WHERE policy_requirement_id = ?13",
            params![
                requirement.regulation_location_id,
                requirement.audit_category_id,
                requirement.code,
                requirement.chapter,
                requirement.section,
                requirement.regulation,
                requirement.question_order,
                requirement.is_active,
                requirement.applicability.recreational(),
                requirement.applicability.medicinal(),
                requirement.organization_id,
                requirement.user_facing_note,
                id.get(),
            ],
        )?;
        Ok((changed > 0).then_some(id))
    }

    fn delete_policy_requirement(&mut self, id: RequirementId) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM policy_requirement WHERE policy_requirement_id = ?1",
            params![id.get()],
        )?;
        Ok(removed > 0)
    }

    fn add_requirement_license_type(&mut self, link: &RequirementLicenseType) -> Result<()> {
        self.conn.execute(
            "INSERT INTO policy_requirement_license_type (policy_requirement_id, license_type_id)
             VALUES (?1, ?2)
             ON CONFLICT (policy_requirement_id, license_type_id) DO NOTHING",
            params![link.requirement_id.get(), link.license_type_id],
        )?;
        Ok(())
    }

    fn add_requirement_vertical(&mut self, link: &RequirementVertical) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO policy_requirement_vertical (policy_requirement_id, license_type_vertical_id)
             VALUES (?1, ?2)
             ON CONFLICT (policy_requirement_id, license_type_vertical_id) DO NOTHING",
            params![link.requirement_id.get(), link.license_type_vertical_id],
        )?;
        let link_id = self.conn.query_row(
            "SELECT policy_requirement_vertical_id FROM policy_requirement_vertical
             WHERE policy_requirement_id = ?1 AND license_type_vertical_id = ?2",
            params![link.requirement_id.get(), link.license_type_vertical_id],
            |row| row.get(0),
        )?;
        Ok(link_id)
    }

    fn add_requirement_permit(&mut self, link: &RequirementPermit) -> Result<()> {
        self.conn.execute(
            "INSERT INTO policy_requirement_permit (policy_requirement_id, license_type_permit_id)
             VALUES (?1, ?2)
             ON CONFLICT (policy_requirement_id, license_type_permit_id) DO NOTHING",
            params![link.requirement_id.get(), link.license_type_permit_id],
        )?;
        Ok(())
    }

    fn add_vertical_technique(&mut self, link: &VerticalTechnique) -> Result<()> {
        self.conn.execute(
            "INSERT INTO policy_vertical_technique (
                policy_requirement_vertical_id, license_type_vertical_technique_id
             ) VALUES (?1, ?2)
             ON CONFLICT (policy_requirement_vertical_id, license_type_vertical_technique_id)
             DO NOTHING",
            params![
                link.policy_requirement_vertical_id,
                link.license_type_vertical_technique_id
            ],
        )?;
        Ok(())
    }

    fn create_policy_compliance(&mut self, compliance: &PolicyCompliance) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO policy_compliance (
                policy_requirement_id, question, non_compliant, action, level, trigger_response
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (policy_requirement_id, level) DO UPDATE SET
                question = excluded.question,
                non_compliant = excluded.non_compliant,
                action = excluded.action,
                trigger_response = excluded.trigger_response",
            params![
                compliance.requirement_id.get(),
                compliance.question,
                yes_no(compliance.non_compliant),
                compliance.action,
                compliance.level.as_str(),
                compliance.trigger_response,
            ],
        )?;
        self.compliance_id(compliance.requirement_id, compliance.level)
    }

    fn delete_policy_compliance(
        &mut self,
        requirement_id: RequirementId,
        level: ComplianceLevel,
    ) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM policy_compliance WHERE policy_requirement_id = ?1 AND level = ?2",
            params![requirement_id.get(), level.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn find_policy_compliance(&self, compliance: &PolicyCompliance) -> Result<Option<i64>> {
        self.scalar_id(
            "SELECT policy_compliance_id FROM policy_compliance
             WHERE policy_requirement_id = ?1 AND question = ?2 AND level = ?3
               AND trigger_response = ?4",
            params![
                compliance.requirement_id.get(),
                compliance.question,
                compliance.level.as_str(),
                compliance.trigger_response,
            ],
        )
    }

    fn begin_unit(&mut self) -> Result<bool> {
        if self.in_unit {
            return Err(StoreError::other("row unit already open"));
        }
        self.conn
            .execute_batch(&format!("SAVEPOINT {UNIT_SAVEPOINT};"))?;
        self.in_unit = true;
        Ok(true)
    }

    fn commit_unit(&mut self) -> Result<()> {
        if self.in_unit {
            self.conn
                .execute_batch(&format!("RELEASE SAVEPOINT {UNIT_SAVEPOINT};"))?;
            self.in_unit = false;
        }
        Ok(())
    }

    fn rollback_unit(&mut self) -> Result<()> {
        if self.in_unit {
            self.conn.execute_batch(&format!(
                "ROLLBACK TO SAVEPOINT {UNIT_SAVEPOINT}; RELEASE SAVEPOINT {UNIT_SAVEPOINT};"
            ))?;
            self.in_unit = false;
        }
        Ok(())
    }
}

struct RequirementRow {
    id: i64,
    location: LocationKey,
    category: String,
    requirement: PolicyRequirement,
}

impl ExportSource for SqliteStore {
    fn requirements_for_location(
        &self,
        location: &LocationKey,
        organization_id: Option<i64>,
    ) -> Result<Vec<RequirementRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.policy_requirement_id, l.city, l.county, l.state, c.category,
                    r.regulation_location_id, r.audit_category_id, r.code, r.chapter,
                    r.section, r.regulation, r.question_order, r.is_active,
                    r.recreational, r.medicinal, r.organization_id, r.user_facing_note
             FROM policy_requirement r
             JOIN regulation_location l ON l.regulation_location_id = r.regulation_location_id
             JOIN audit_category c ON c.audit_category_id = r.audit_category_id
             WHERE l.city = ?1 AND l.county = ?2 AND l.state = ?3
               AND r.is_active = 1
               AND (?4 IS NULL OR r.organization_id IS NULL OR r.organization_id = ?4)
             ORDER BY r.question_order IS NULL, r.question_order, r.policy_requirement_id",
        )?;
        let rows = stmt
            .query_map(
                params![
                    location.city.trim(),
                    location.county.trim(),
                    location.state.trim(),
                    organization_id
                ],
                |row| {
                    Ok(RequirementRow {
                        id: row.get(0)?,
                        location: LocationKey {
                            city: row.get(1)?,
                            county: row.get(2)?,
                            state: row.get(3)?,
                        },
                        category: row.get(4)?,
                        requirement: PolicyRequirement {
                            regulation_location_id: row.get(5)?,
                            audit_category_id: row.get(6)?,
                            code: row.get(7)?,
                            chapter: row.get(8)?,
                            section: row.get(9)?,
                            regulation: row.get(10)?,
                            question_order: row.get(11)?,
                            is_active: row.get(12)?,
                            applicability: Applicability::from_flags(row.get(13)?, row.get(14)?),
                            organization_id: row.get(15)?,
                            user_facing_note: row.get(16)?,
                        },
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|row| -> Result<RequirementRecord> {
                Ok(RequirementRecord {
                    id: RequirementId::new(row.id)?,
                    location: row.location,
                    category: row.category,
                    requirement: row.requirement,
                })
            })
            .collect()
    }

    fn policy_compliances(&self, id: RequirementId) -> Result<Vec<PolicyCompliance>> {
        let mut stmt = self.conn.prepare(
            "SELECT question, non_compliant, action, level, trigger_response
             FROM policy_compliance WHERE policy_requirement_id = ?1
             ORDER BY level, policy_compliance_id",
        )?;
        let rows = stmt
            .query_map(params![id.get()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(question, non_compliant, action, level, trigger_response)| -> Result<PolicyCompliance> {
                Ok(PolicyCompliance {
                    requirement_id: id,
                    question,
                    non_compliant: non_compliant.eq_ignore_ascii_case("yes"),
                    action,
                    level: level.parse()?,
                    trigger_response,
                })
            })
            .collect()
    }

    fn license_type_names(&self, id: RequirementId) -> Result<Vec<String>> {
        self.names(
            "SELECT lt.name FROM policy_requirement_license_type link
             JOIN license_type lt ON lt.license_type_id = link.license_type_id
             WHERE link.policy_requirement_id = ?1
             ORDER BY link.policy_requirement_license_type_id",
            id,
        )
    }

    fn vertical_names(&self, id: RequirementId) -> Result<Vec<String>> {
        self.names(
            "SELECT v.name FROM policy_requirement_vertical link
             JOIN license_type_vertical v ON v.license_type_vertical_id = link.license_type_vertical_id
             WHERE link.policy_requirement_id = ?1
             ORDER BY link.policy_requirement_vertical_id",
            id,
        )
    }

    fn permit_names(&self, id: RequirementId) -> Result<Vec<String>> {
        self.names(
            "SELECT p.name FROM policy_requirement_permit link
             JOIN license_type_permit p ON p.license_type_permit_id = link.license_type_permit_id
             WHERE link.policy_requirement_id = ?1
             ORDER BY link.policy_requirement_permit_id",
            id,
        )
    }

    fn technique_names(&self, id: RequirementId) -> Result<Vec<String>> {
        self.names(
            "SELECT t.name FROM policy_vertical_technique pvt
             JOIN policy_requirement_vertical prv
               ON prv.policy_requirement_vertical_id = pvt.policy_requirement_vertical_id
             JOIN license_type_vertical_technique t
               ON t.license_type_vertical_technique_id = pvt.license_type_vertical_technique_id
             WHERE prv.policy_requirement_id = ?1
             GROUP BY t.license_type_vertical_technique_id
             ORDER BY MIN(pvt.policy_vertical_technique_id)",
            id,
        )
    }

    fn organization_name(&self, organization_id: i64) -> Result<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM organization WHERE organization_id = ?1 AND is_active = 1",
                params![organization_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }
}

impl ReferenceWriter for SqliteStore {
    fn insert_location(&mut self, key: &LocationKey) -> Result<i64> {
        if let Some(id) = self.find_location(key)? {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO regulation_location (city, county, state) VALUES (?1, ?2, ?3)",
            params![key.city.trim(), key.county.trim(), key.state.trim()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_organization(&mut self, name: &str) -> Result<i64> {
        if let Some(id) = self.find_organization(name)? {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO organization (name) VALUES (?1)",
            params![name.trim()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_audit_category(&mut self, name: &str, organization_id: Option<i64>) -> Result<i64> {
        if let Some(id) = self.scalar_id(
            "SELECT audit_category_id FROM audit_category
             WHERE category = ?1 AND organization_id IS ?2",
            params![name.trim(), organization_id],
        )? {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO audit_category (category, organization_id) VALUES (?1, ?2)",
            params![name.trim(), organization_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_license_type(&mut self, name: &str) -> Result<i64> {
        if let Some(id) = self.find_license_type(name)? {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO license_type (name) VALUES (?1)",
            params![name.trim()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_license_type_vertical(&mut self, license_type_id: i64, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO license_type_vertical (license_type_id, name) VALUES (?1, ?2)
             ON CONFLICT (license_type_id, name) DO NOTHING",
            params![license_type_id, name.trim()],
        )?;
        let id = self.conn.query_row(
            "SELECT license_type_vertical_id FROM license_type_vertical
             WHERE license_type_id = ?1 AND name = ?2",
            params![license_type_id, name.trim()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn insert_license_type_permit(&mut self, license_type_id: i64, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO license_type_permit (license_type_id, name) VALUES (?1, ?2)
             ON CONFLICT (license_type_id, name) DO NOTHING",
            params![license_type_id, name.trim()],
        )?;
        let id = self.conn.query_row(
            "SELECT license_type_permit_id FROM license_type_permit
             WHERE license_type_id = ?1 AND name = ?2",
            params![license_type_id, name.trim()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn insert_vertical_technique(
        &mut self,
        license_type_vertical_id: i64,
        name: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO license_type_vertical_technique (license_type_vertical_id, name)
             VALUES (?1, ?2)
             ON CONFLICT (license_type_vertical_id, name) DO NOTHING",
            params![license_type_vertical_id, name.trim()],
        )?;
        let id = self.conn.query_row(
            "SELECT license_type_vertical_technique_id FROM license_type_vertical_technique
             WHERE license_type_vertical_id = ?1 AND name = ?2",
            params![license_type_vertical_id, name.trim()],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.connection().execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let requirement = crate::memory::blank_requirement(41, 42);
        let err = store.create_policy_requirement(&requirement).unwrap_err();
        assert_eq!(err.kind(), "constraint");
    }

    #[test]
    fn test_savepoint_rollback() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let loc = store.insert_location(&LocationKey::new("", "", "CA")).unwrap();
        let cat = store.insert_audit_category("Security", None).unwrap();

        assert!(store.begin_unit().unwrap());
        assert!(store.begin_unit().is_err());
        store
            .create_policy_requirement(&crate::memory::blank_requirement(loc, cat))
            .unwrap();
        store.rollback_unit().unwrap();

        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM policy_requirement", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
