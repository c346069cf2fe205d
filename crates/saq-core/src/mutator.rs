//! Row-to-requirement mutation.
//!
//! One row carries at most one requirement's worth of change. Add and update
//! rows write the requirement and then populate its dependents in a fixed
//! order: license types, verticals with their techniques, permits, then
//! compliance records. The first dependent failure abandons the rest.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use saq_model::{
    Applicability, PolicyRequirement, RequirementId, RequirementLicenseType, RequirementPermit,
    RequirementVertical, RowAction, SaqColumn, SaqRow, VerticalTechnique,
};
use saq_store::{RequirementStore, StoreError};
use saq_validate::checks::fields::parse_question_order;
use saq_validate::{ResolveError, ResolvedRow, resolve_references};

use crate::error::MutationError;
use crate::reconciler::{ComplianceMode, ComplianceReconciler};

/// Dependent groups populated after a requirement write, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependentKind {
    LicenseTypes,
    Verticals,
    Permits,
    Compliance,
}

impl DependentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependentKind::LicenseTypes => "license types",
            DependentKind::Verticals => "verticals",
            DependentKind::Permits => "permits",
            DependentKind::Compliance => "compliance",
        }
    }
}

impl fmt::Display for DependentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far dependent population got for a committed requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DependentStatus {
    Complete,
    Partial {
        completed: Vec<DependentKind>,
        failed: DependentKind,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    /// The requirement write stuck.
    Committed {
        requirement_id: RequirementId,
        dependents: DependentStatus,
    },
    Deleted {
        requirement_id: RequirementId,
        existed: bool,
    },
    /// A dependent failed inside a row unit and the whole row was undone.
    RolledBack { failed: DependentKind, error: String },
    /// The requirement write was refused; nothing was written.
    NotCommitted { reason: String },
    /// The action cell did not request a mutation.
    Skipped { raw_action: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    /// Zero-based data row index.
    pub index: usize,
    /// 1-based row in the source sheet.
    pub sheet_row: usize,
    pub action: Option<RowAction>,
    #[serde(flatten)]
    pub status: RowStatus,
}

impl RowOutcome {
    pub fn is_partial(&self) -> bool {
        matches!(
            self.status,
            RowStatus::Committed {
                dependents: DependentStatus::Partial { .. },
                ..
            }
        )
    }
}

/// Applies row actions against a store it owns for the run.
#[derive(Debug)]
pub struct RequirementMutator<S> {
    store: S,
    reconciler: ComplianceReconciler,
    atomic_rows: bool,
}

impl<S: RequirementStore> RequirementMutator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            reconciler: ComplianceReconciler::new(),
            atomic_rows: true,
        }
    }

    /// Run each row inside a row unit when the store supports it.
    #[must_use]
    pub fn with_atomic_rows(mut self, atomic_rows: bool) -> Self {
        self.atomic_rows = atomic_rows;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn reconciler(&self) -> &ComplianceReconciler {
        &self.reconciler
    }

    /// Split borrow for callers that drive the reconciler directly.
    pub fn parts_mut(&mut self) -> (&mut S, &ComplianceReconciler) {
        (&mut self.store, &self.reconciler)
    }

    /// Apply one row.
    ///
    /// Constraint and connectivity failures on the requirement write yield
    /// [`RowStatus::NotCommitted`]. Any other storage fault on that write is
    /// returned as an error. Dependent failures never escape as errors.
    pub fn apply_row(&mut self, row: &SaqRow) -> Result<RowOutcome, MutationError> {
        info!(row = row.sheet_row(), "processing row");
        let action = row.action();
        let status = match action {
            Some(RowAction::Add) => self.write_row(row, None)?,
            Some(RowAction::Update) => match row.requirement_id() {
                Some(id) => self.write_row(row, Some(id))?,
                None => missing_id(row),
            },
            Some(RowAction::Delete) => match row.requirement_id() {
                Some(id) => self.delete_row(row, id)?,
                None => missing_id(row),
            },
            None => {
                let raw_action = row.trimmed(SaqColumn::Action).to_string();
                warn!(row = row.sheet_row(), action = %raw_action, "skipping row without a mutation");
                RowStatus::Skipped { raw_action }
            }
        };
        Ok(RowOutcome {
            index: row.index,
            sheet_row: row.sheet_row(),
            action,
            status,
        })
    }

    fn delete_row(&mut self, row: &SaqRow, id: RequirementId) -> Result<RowStatus, MutationError> {
        match self.store.delete_policy_requirement(id) {
            Ok(existed) => {
                if !existed {
                    warn!(row = row.sheet_row(), requirement_id = %id, "requirement to delete not found");
                }
                Ok(RowStatus::Deleted {
                    requirement_id: id,
                    existed,
                })
            }
            Err(err) => refused(row, err),
        }
    }

    /// Add (`existing == None`) or update a requirement and its dependents.
    fn write_row(
        &mut self,
        row: &SaqRow,
        existing: Option<RequirementId>,
    ) -> Result<RowStatus, MutationError> {
        let resolved = match resolve_references(row, &self.store) {
            Ok(resolved) => resolved,
            Err(ResolveError::Store(err)) => return refused(row, err),
            Err(unresolved) => {
                warn!(row = row.sheet_row(), "row references did not resolve");
                return Ok(RowStatus::NotCommitted {
                    reason: unresolved.describe(),
                });
            }
        };
        let requirement = match build_requirement(row, &resolved) {
            Ok(requirement) => requirement,
            Err(reason) => return Ok(RowStatus::NotCommitted { reason }),
        };

        let in_unit = if self.atomic_rows {
            match self.store.begin_unit() {
                Ok(in_unit) => in_unit,
                Err(err) => return refused(row, err),
            }
        } else {
            false
        };

        let written = match existing {
            None => self.store.create_policy_requirement(&requirement).map(Some),
            Some(id) => self.store.update_policy_requirement(id, &requirement),
        };
        let requirement_id = match written {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.abandon_unit(in_unit);
                let reason = format!(
                    "policy requirement {} not found",
                    existing.map(|id| id.to_string()).unwrap_or_default()
                );
                warn!(row = row.sheet_row(), %reason, "update skipped");
                return Ok(RowStatus::NotCommitted { reason });
            }
            Err(err) => {
                self.abandon_unit(in_unit);
                return refused(row, err);
            }
        };
        debug!(row = row.sheet_row(), requirement_id = %requirement_id, "requirement written");

        let dependents = match self.populate_dependents(row, requirement_id, &resolved) {
            Ok(()) => DependentStatus::Complete,
            Err((completed, failed, err)) => {
                warn!(
                    row = row.sheet_row(),
                    requirement_id = %requirement_id,
                    dependent = %failed,
                    error = %err,
                    "dependent population failed"
                );
                if in_unit {
                    self.abandon_unit(true);
                    return Ok(RowStatus::RolledBack {
                        failed,
                        error: err.to_string(),
                    });
                }
                DependentStatus::Partial {
                    completed,
                    failed,
                    error: err.to_string(),
                }
            }
        };

        if in_unit && let Err(err) = self.store.commit_unit() {
            self.abandon_unit(true);
            return refused(row, err);
        }

        Ok(RowStatus::Committed {
            requirement_id,
            dependents,
        })
    }

    fn populate_dependents(
        &mut self,
        row: &SaqRow,
        requirement_id: RequirementId,
        resolved: &ResolvedRow,
    ) -> Result<(), DependentFailure> {
        let mut completed = Vec::new();
        let result = self.link_license_types(requirement_id, resolved);
        record_step(DependentKind::LicenseTypes, &mut completed, result)?;

        let result = self.link_verticals(requirement_id, resolved);
        record_step(DependentKind::Verticals, &mut completed, result)?;

        if !row.is_blank(SaqColumn::Permit) {
            let result = self.link_permits(requirement_id, resolved);
            record_step(DependentKind::Permits, &mut completed, result)?;
        }

        let result = self
            .reconciler
            .reconcile(&mut self.store, row, requirement_id, ComplianceMode::Persist)
            .map(|_| ());
        record_step(DependentKind::Compliance, &mut completed, result)
    }

    fn link_license_types(
        &mut self,
        requirement_id: RequirementId,
        resolved: &ResolvedRow,
    ) -> Result<(), StoreError> {
        for license_type_id in &resolved.license_types {
            self.store
                .add_requirement_license_type(&RequirementLicenseType {
                    requirement_id,
                    license_type_id: *license_type_id,
                })?;
        }
        Ok(())
    }

    fn link_verticals(
        &mut self,
        requirement_id: RequirementId,
        resolved: &ResolvedRow,
    ) -> Result<(), StoreError> {
        for vertical in &resolved.verticals {
            let link_id = self.store.add_requirement_vertical(&RequirementVertical {
                requirement_id,
                license_type_vertical_id: vertical.license_type_vertical_id,
            })?;
            for technique_id in &vertical.techniques {
                self.store.add_vertical_technique(&VerticalTechnique {
                    policy_requirement_vertical_id: link_id,
                    license_type_vertical_technique_id: *technique_id,
                })?;
            }
        }
        Ok(())
    }

    fn link_permits(
        &mut self,
        requirement_id: RequirementId,
        resolved: &ResolvedRow,
    ) -> Result<(), StoreError> {
        for permit_id in &resolved.permits {
            self.store.add_requirement_permit(&RequirementPermit {
                requirement_id,
                license_type_permit_id: *permit_id,
            })?;
        }
        Ok(())
    }

    fn abandon_unit(&mut self, in_unit: bool) {
        if in_unit && let Err(err) = self.store.rollback_unit() {
            warn!(error = %err, "row unit rollback failed");
        }
    }
}

/// Build the requirement entity from a row and its resolved references.
pub fn build_requirement(row: &SaqRow, resolved: &ResolvedRow) -> Result<PolicyRequirement, String> {
    let order = row.trimmed(SaqColumn::QuestionOrder);
    let question_order = if order.is_empty() {
        None
    } else {
        Some(
            parse_question_order(order)
                .ok_or_else(|| format!("invalid question order '{order}'"))?,
        )
    };
    let applicability =
        Applicability::parse_cell(row.get(SaqColumn::Applicability)).map_err(|e| e.to_string())?;

    Ok(PolicyRequirement {
        regulation_location_id: resolved.location_id,
        audit_category_id: resolved.category_id,
        code: row.trimmed(SaqColumn::Code).to_string(),
        chapter: row.trimmed(SaqColumn::Chapter).to_string(),
        section: row.trimmed(SaqColumn::Section).to_string(),
        regulation: row.trimmed(SaqColumn::Regulation).to_string(),
        question_order,
        is_active: true,
        applicability,
        organization_id: resolved.organization_id,
        user_facing_note: row.trimmed(SaqColumn::UserFacingNote).to_string(),
    })
}

type DependentFailure = (Vec<DependentKind>, DependentKind, StoreError);

fn record_step(
    kind: DependentKind,
    completed: &mut Vec<DependentKind>,
    result: Result<(), StoreError>,
) -> Result<(), DependentFailure> {
    match result {
        Ok(()) => {
            completed.push(kind);
            Ok(())
        }
        Err(err) => Err((completed.clone(), kind, err)),
    }
}

fn missing_id(row: &SaqRow) -> RowStatus {
    let reason = format!(
        "invalid policy requirement id '{}'",
        row.trimmed(SaqColumn::PolicyRequirementId)
    );
    warn!(row = row.sheet_row(), %reason, "row not committed");
    RowStatus::NotCommitted { reason }
}

/// Recognized storage errors refuse the row; anything else aborts the file.
fn refused(row: &SaqRow, err: StoreError) -> Result<RowStatus, MutationError> {
    if err.is_recognized() {
        warn!(row = row.sheet_row(), kind = err.kind(), error = %err, "row not committed");
        Ok(RowStatus::NotCommitted {
            reason: err.to_string(),
        })
    } else {
        Err(MutationError::Store {
            row: row.sheet_row(),
            source: err,
        })
    }
}
