//! Row mutation against the in-memory store.

use proptest::prelude::*;
use saq_core::{DependentKind, DependentStatus, RequirementMutator, RowStatus};
use saq_model::{ComplianceLevel, RequirementId, RowAction, SaqColumn, SaqRow};
use saq_store::{MemoryStore, ReferenceData, StoreError, StoreOp, seed};

const REFERENCE: &str = r#"
[[locations]]
city = "Oakland"
state = "CA"

[[categories]]
name = "Inventory"

[[license_types]]
name = "Retail"
permits = ["Delivery"]

[[license_types.verticals]]
name = "Storefront"
techniques = ["Walk-in"]

[[license_types.verticals]]
name = "Lounge"

[[license_types]]
name = "Cultivation"

[[license_types.verticals]]
name = "Indoor"
"#;

fn seeded(mut store: MemoryStore) -> MemoryStore {
    seed(&mut store, &ReferenceData::from_toml_str(REFERENCE).unwrap()).unwrap();
    store.clear_calls();
    store
}

fn mutator() -> RequirementMutator<MemoryStore> {
    RequirementMutator::new(seeded(MemoryStore::new()))
}

fn row(index: usize, action: &str) -> SaqRow {
    SaqRow::new(index)
        .with(SaqColumn::Action, action)
        .with(SaqColumn::City, "Oakland")
        .with(SaqColumn::State, "CA")
        .with(SaqColumn::Category, "Inventory")
        .with(SaqColumn::LicenseType, "Retail")
        .with(SaqColumn::InitialAuditQuestion, "Is inventory reconciled daily?")
        .with(SaqColumn::InitialAuditResponse, "Yes")
        .with(SaqColumn::InitialActionForNonCompliance, "Reconcile inventory")
}

fn committed_id(status: &RowStatus) -> RequirementId {
    match status {
        RowStatus::Committed { requirement_id, .. } => *requirement_id,
        other => panic!("expected a committed row, got {other:?}"),
    }
}

#[test]
fn test_add_creates_requirement_and_license_type_links() {
    let mut mutator = mutator();
    let row = row(0, "add").with(SaqColumn::LicenseType, "Retail, Cultivation");

    let outcome = mutator.apply_row(&row).unwrap();
    let id = committed_id(&outcome.status);

    let store = mutator.store();
    assert_eq!(store.count(StoreOp::CreateRequirement), 1);
    assert_eq!(store.count(StoreOp::AddLicenseType), 2);
    assert_eq!(store.count(StoreOp::AddPermit), 0);
    assert_eq!(store.requirement_count(), 1);
    assert_eq!(store.license_type_links(id).len(), 2);
    // Empty vertical cell links every vertical of both license types.
    assert_eq!(store.vertical_links(id).len(), 3);
}

#[test]
fn test_permit_links_only_when_named() {
    let mut mutator = mutator();
    let outcome = mutator
        .apply_row(&row(0, "add").with(SaqColumn::Permit, "Delivery"))
        .unwrap();
    let id = committed_id(&outcome.status);
    assert_eq!(mutator.store().count(StoreOp::AddPermit), 1);
    assert_eq!(mutator.store().permit_links(id).len(), 1);
}

#[test]
fn test_named_vertical_links_its_techniques() {
    let mut mutator = mutator();
    let row = row(0, "add")
        .with(SaqColumn::Vertical, "Storefront")
        .with(SaqColumn::Technique, "Walk-in");
    let outcome = mutator.apply_row(&row).unwrap();
    let id = committed_id(&outcome.status);
    assert_eq!(mutator.store().vertical_links(id).len(), 1);
    assert_eq!(mutator.store().technique_link_count(), 1);
}

#[test]
fn test_yes_answer_without_trigger_writes_only_primary() {
    let mut mutator = mutator();
    let outcome = mutator.apply_row(&row(0, "add")).unwrap();
    let id = committed_id(&outcome.status);

    let records = mutator.store().compliances(id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, ComplianceLevel::Primary);
    assert!(!records[0].non_compliant);
    assert_eq!(records[0].question, "Is inventory reconciled daily?");
    assert_eq!(records[0].action, "Reconcile inventory");
}

#[test]
fn test_quoted_trigger_writes_secondary() {
    let mut mutator = mutator();
    let row = row(0, "add")
        .with(SaqColumn::ResponseForSecondaryAuditQuestion, "\"Yes\"")
        .with(SaqColumn::SecondaryAuditQuestion, "Are counts logged?")
        .with(SaqColumn::SecondaryAuditResponse, "No")
        .with(SaqColumn::SecondaryAuditForNonCompliance, "Log counts");
    let outcome = mutator.apply_row(&row).unwrap();
    let id = committed_id(&outcome.status);

    let records = mutator.store().compliances(id);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].level, ComplianceLevel::Primary);
    assert!(!records[0].non_compliant);
    assert_eq!(records[1].level, ComplianceLevel::Secondary);
    assert_eq!(records[1].trigger_response, "Yes");
    assert!(records[1].non_compliant);
    assert_eq!(records[1].question, "Are counts logged?");
}

#[test]
fn test_delete_issues_single_delete_call() {
    let mut mutator = mutator();
    let row = SaqRow::new(0)
        .with(SaqColumn::Action, "delete")
        .with(SaqColumn::PolicyRequirementId, "7");

    let outcome = mutator.apply_row(&row).unwrap();

    let store = mutator.store();
    assert_eq!(store.count(StoreOp::DeleteRequirement), 1);
    assert_eq!(store.count(StoreOp::CreateRequirement), 0);
    assert_eq!(store.count(StoreOp::UpdateRequirement), 0);
    assert_eq!(
        outcome.status,
        RowStatus::Deleted {
            requirement_id: RequirementId::new(7).unwrap(),
            existed: false,
        }
    );
}

#[test]
fn test_delete_cascades_dependents() {
    let mut mutator = mutator();
    let id = committed_id(&mutator.apply_row(&row(0, "add")).unwrap().status);
    let delete = SaqRow::new(1)
        .with(SaqColumn::Action, "Delete")
        .with(SaqColumn::PolicyRequirementId, id.to_string());

    let outcome = mutator.apply_row(&delete).unwrap();

    assert!(matches!(outcome.status, RowStatus::Deleted { existed: true, .. }));
    let store = mutator.store();
    assert_eq!(store.requirement_count(), 0);
    assert!(store.compliances(id).is_empty());
    assert!(store.license_type_links(id).is_empty());
}

#[test]
fn test_unknown_action_is_skipped_and_later_rows_run() {
    let mut mutator = mutator();

    let skipped = mutator.apply_row(&row(0, "archive")).unwrap();
    assert_eq!(skipped.action, None);
    assert_eq!(
        skipped.status,
        RowStatus::Skipped {
            raw_action: "archive".to_string()
        }
    );
    assert_eq!(mutator.store().mutation_count(), 0);

    let added = mutator.apply_row(&row(1, "add")).unwrap();
    committed_id(&added.status);
    assert_eq!(mutator.store().count(StoreOp::CreateRequirement), 1);
}

#[test]
fn test_update_rewrites_requirement_and_converges() {
    let mut mutator = mutator();
    let id = committed_id(&mutator.apply_row(&row(0, "add")).unwrap().status);
    let update = row(1, "update")
        .with(SaqColumn::PolicyRequirementId, id.to_string())
        .with(SaqColumn::Code, "BPC 26070")
        .with(SaqColumn::InitialAuditResponse, "No");

    let outcome = mutator.apply_row(&update).unwrap();

    assert_eq!(committed_id(&outcome.status), id);
    let store = mutator.store();
    assert_eq!(store.count(StoreOp::UpdateRequirement), 1);
    assert_eq!(store.requirement(id).unwrap().code, "BPC 26070");
    assert_eq!(store.license_type_links(id).len(), 1);
    let records = store.compliances(id);
    assert_eq!(records.len(), 1);
    assert!(records[0].non_compliant);
}

#[test]
fn test_update_without_trigger_drops_secondary_compliance() {
    let mut mutator = mutator();
    let add = row(0, "add")
        .with(SaqColumn::ResponseForSecondaryAuditQuestion, "\"Yes\"")
        .with(SaqColumn::SecondaryAuditQuestion, "Logged?")
        .with(SaqColumn::SecondaryAuditResponse, "Yes");
    let id = committed_id(&mutator.apply_row(&add).unwrap().status);
    assert_eq!(mutator.store().compliances(id).len(), 2);

    let update = row(1, "update").with(SaqColumn::PolicyRequirementId, id.to_string());
    let outcome = mutator.apply_row(&update).unwrap();

    assert_eq!(committed_id(&outcome.status), id);
    let records = mutator.store().compliances(id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, ComplianceLevel::Primary);
    assert_eq!(records[0].question, "Is inventory reconciled daily?");
    assert_eq!(records[0].trigger_response, "");
}

#[test]
fn test_update_of_missing_requirement_is_not_committed() {
    let mut mutator = mutator();
    let update = row(0, "update").with(SaqColumn::PolicyRequirementId, "99");

    let outcome = mutator.apply_row(&update).unwrap();

    match outcome.status {
        RowStatus::NotCommitted { reason } => assert!(reason.contains("99")),
        other => panic!("expected not committed, got {other:?}"),
    }
    assert_eq!(mutator.store().count(StoreOp::CreateCompliance), 0);
}

#[test]
fn test_constraint_error_refuses_row_only() {
    let mut mutator = mutator();
    mutator
        .store_mut()
        .fail_next(StoreOp::CreateRequirement, StoreError::constraint("duplicate"));

    let refused = mutator.apply_row(&row(0, "add")).unwrap();
    assert!(matches!(refused.status, RowStatus::NotCommitted { .. }));
    assert_eq!(mutator.store().count(StoreOp::AddLicenseType), 0);

    let next = mutator.apply_row(&row(1, "add")).unwrap();
    committed_id(&next.status);
}

#[test]
fn test_unrecognized_error_is_returned() {
    let mut mutator = mutator();
    mutator
        .store_mut()
        .fail_next(StoreOp::CreateRequirement, StoreError::other("disk I/O error"));

    let err = mutator.apply_row(&row(4, "add")).unwrap_err();
    assert_eq!(err.row(), 6);
}

#[test]
fn test_dependent_failure_rolls_back_row_unit() {
    let mut mutator = RequirementMutator::new(seeded(MemoryStore::new().with_transactions(true)));
    mutator
        .store_mut()
        .fail_next(StoreOp::AddVertical, StoreError::other("link failed"));

    let outcome = mutator.apply_row(&row(0, "add")).unwrap();

    assert!(matches!(
        outcome.status,
        RowStatus::RolledBack {
            failed: DependentKind::Verticals,
            ..
        }
    ));
    assert_eq!(mutator.store().requirement_count(), 0);
}

#[test]
fn test_dependent_failure_without_units_is_partial() {
    let mut mutator = mutator();
    mutator
        .store_mut()
        .fail_next(StoreOp::CreateCompliance, StoreError::connectivity("gone"));

    let outcome = mutator.apply_row(&row(0, "add")).unwrap();

    assert!(outcome.is_partial());
    match outcome.status {
        RowStatus::Committed {
            dependents: DependentStatus::Partial {
                completed, failed, ..
            },
            ..
        } => {
            assert_eq!(completed, vec![DependentKind::LicenseTypes, DependentKind::Verticals]);
            assert_eq!(failed, DependentKind::Compliance);
        }
        other => panic!("expected partial commit, got {other:?}"),
    }
    assert_eq!(mutator.store().requirement_count(), 1);
}

proptest! {
    #[test]
    fn prop_padded_add_dispatches(action in "[ \t]{0,3}[aA][dD][dD][ \t]{0,3}") {
        let mut mutator = mutator();
        let outcome = mutator.apply_row(&row(0, &action)).unwrap();
        prop_assert_eq!(outcome.action, Some(RowAction::Add));
        prop_assert!(
            matches!(outcome.status, RowStatus::Committed { .. }),
            "unexpected status {:?}",
            outcome.status
        );
        prop_assert_eq!(mutator.store().count(StoreOp::CreateRequirement), 1);
    }

    #[test]
    fn prop_padded_delete_dispatches(action in "[ \t]{0,3}[dD][eE][lL][eE][tT][eE][ \t]{0,3}") {
        let mut mutator = mutator();
        let row = SaqRow::new(0)
            .with(SaqColumn::Action, action)
            .with(SaqColumn::PolicyRequirementId, "3");
        let outcome = mutator.apply_row(&row).unwrap();
        prop_assert_eq!(outcome.action, Some(RowAction::Delete));
        prop_assert_eq!(mutator.store().count(StoreOp::DeleteRequirement), 1);
        prop_assert_eq!(mutator.store().count(StoreOp::CreateRequirement), 0);
    }

    #[test]
    fn prop_padded_update_dispatches(action in "[ \t]{0,3}[uU][pP][dD][aA][tT][eE][ \t]{0,3}") {
        let mut mutator = mutator();
        let id = committed_id(&mutator.apply_row(&row(0, "add")).unwrap().status);
        let update = row(1, &action).with(SaqColumn::PolicyRequirementId, id.to_string());
        let outcome = mutator.apply_row(&update).unwrap();
        prop_assert_eq!(outcome.action, Some(RowAction::Update));
        prop_assert_eq!(mutator.store().count(StoreOp::UpdateRequirement), 1);
        prop_assert_eq!(mutator.store().count(StoreOp::CreateRequirement), 1);
    }
}
