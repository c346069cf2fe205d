//! Compliance record derivation and reconciliation.
//!
//! A row always yields a primary (level 1) record. A secondary (level 2)
//! record follows when the trigger cell is filled in; it carries the cleaned
//! trigger as the primary answer that unlocks it.

use serde::Serialize;
use tracing::debug;

use saq_model::{
    ComplianceLevel, PolicyCompliance, RequirementId, SaqColumn, SaqRow, clean_trigger_response,
    non_compliant_for, secondary_applies,
};
use saq_store::{RequirementStore, StoreError};

/// Whether records are written or only looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceMode {
    Persist,
    Verify,
}

/// Primary record plus the optional secondary record of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceRecords {
    pub primary: PolicyCompliance,
    pub secondary: Option<PolicyCompliance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComplianceOutcome {
    Persisted { primary: i64, secondary: Option<i64> },
    Verified { primary: i64, secondary: Option<i64> },
    NotFound { level: ComplianceLevel },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComplianceReconciler;

impl ComplianceReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Build the records a row describes for a requirement.
    pub fn derive(&self, row: &SaqRow, requirement_id: RequirementId) -> ComplianceRecords {
        let primary = PolicyCompliance {
            requirement_id,
            question: row.trimmed(SaqColumn::InitialAuditQuestion).to_string(),
            non_compliant: non_compliant_for(row.get(SaqColumn::InitialAuditResponse)),
            action: row
                .trimmed(SaqColumn::InitialActionForNonCompliance)
                .to_string(),
            level: ComplianceLevel::Primary,
            trigger_response: String::new(),
        };

        let trigger = row.get(SaqColumn::ResponseForSecondaryAuditQuestion);
        let secondary = secondary_applies(trigger).then(|| PolicyCompliance {
            requirement_id,
            question: row.trimmed(SaqColumn::SecondaryAuditQuestion).to_string(),
            non_compliant: non_compliant_for(row.get(SaqColumn::SecondaryAuditResponse)),
            action: row
                .trimmed(SaqColumn::SecondaryAuditForNonCompliance)
                .to_string(),
            level: ComplianceLevel::Secondary,
            trigger_response: clean_trigger_response(trigger),
        });

        ComplianceRecords { primary, secondary }
    }

    /// Persist the row's records, or check that they already exist.
    ///
    /// The primary record is always handled first; in verify mode a missing
    /// primary stops before the secondary is looked up. Persisting a row
    /// without a trigger removes any stored secondary record.
    pub fn reconcile<S: RequirementStore + ?Sized>(
        &self,
        store: &mut S,
        row: &SaqRow,
        requirement_id: RequirementId,
        mode: ComplianceMode,
    ) -> Result<ComplianceOutcome, StoreError> {
        let records = self.derive(row, requirement_id);
        match mode {
            ComplianceMode::Persist => {
                let primary = store.create_policy_compliance(&records.primary)?;
                let secondary = match &records.secondary {
                    Some(record) => Some(store.create_policy_compliance(record)?),
                    None => {
                        let removed = store
                            .delete_policy_compliance(requirement_id, ComplianceLevel::Secondary)?;
                        if removed {
                            debug!(requirement_id = %requirement_id, "removed secondary compliance");
                        }
                        None
                    }
                };
                debug!(
                    requirement_id = %requirement_id,
                    secondary = secondary.is_some(),
                    "persisted compliance"
                );
                Ok(ComplianceOutcome::Persisted { primary, secondary })
            }
            ComplianceMode::Verify => {
                let Some(primary) = store.find_policy_compliance(&records.primary)? else {
                    return Ok(ComplianceOutcome::NotFound {
                        level: ComplianceLevel::Primary,
                    });
                };
                let secondary = match &records.secondary {
                    Some(record) => match store.find_policy_compliance(record)? {
                        Some(id) => Some(id),
                        None => {
                            return Ok(ComplianceOutcome::NotFound {
                                level: ComplianceLevel::Secondary,
                            });
                        }
                    },
                    None => None,
                };
                Ok(ComplianceOutcome::Verified { primary, secondary })
            }
        }
    }
}
