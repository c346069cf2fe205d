//! Reference checks against a seeded catalog.

use saq_model::{SaqColumn, SaqRow};
use saq_store::{MemoryStore, ReferenceCatalog, ReferenceData, seed};
use saq_validate::{ContentIssue, ResolveError, SaqValidator, resolve_references};

const REFERENCE: &str = r#"
organizations = ["Acme"]

[[locations]]
city = "Oakland"
state = "CA"

[[categories]]
name = "Security"
organization = "Acme"

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
permits = ["Delivery"]

[[license_types.verticals]]
name = "Indoor"
techniques = ["Hydroponic"]
"#;

fn catalog() -> MemoryStore {
    let mut store = MemoryStore::new();
    seed(&mut store, &ReferenceData::from_toml_str(REFERENCE).unwrap()).unwrap();
    store
}

fn add_row() -> SaqRow {
    SaqRow::new(0)
        .with(SaqColumn::Action, "add")
        .with(SaqColumn::City, "Oakland")
        .with(SaqColumn::State, "CA")
        .with(SaqColumn::Category, "Inventory")
        .with(SaqColumn::LicenseType, "Retail")
        .with(SaqColumn::InitialAuditQuestion, "Is inventory tracked?")
        .with(SaqColumn::InitialAuditResponse, "Yes")
}

#[test]
fn test_empty_vertical_links_every_vertical_of_license_types() {
    let store = catalog();
    let resolved = resolve_references(&add_row(), &store).unwrap();
    assert_eq!(resolved.license_types.len(), 1);
    assert_eq!(resolved.verticals.len(), 2);
    assert!(resolved.permits.is_empty());
    assert_eq!(resolved.organization_id, None);
}

#[test]
fn test_named_references_resolve() {
    let store = catalog();
    let row = add_row()
        .with(SaqColumn::Organization, "acme")
        .with(SaqColumn::Category, "Security")
        .with(SaqColumn::LicenseType, "Retail, Cultivation")
        .with(SaqColumn::Vertical, "Storefront,Indoor")
        .with(SaqColumn::Technique, "walk-in")
        .with(SaqColumn::Permit, "Delivery");
    let resolved = resolve_references(&row, &store).unwrap();
    assert_eq!(resolved.organization_id, store.find_organization("Acme").unwrap());
    assert_eq!(resolved.license_types.len(), 2);
    assert_eq!(resolved.verticals.len(), 2);
    assert_eq!(resolved.verticals[0].techniques.len(), 1);
    assert!(resolved.verticals[1].techniques.is_empty());
    // One permit name offered by both license types.
    assert_eq!(resolved.permits.len(), 2);
}

#[test]
fn test_unresolved_names_are_all_reported() {
    let store = catalog();
    let row = add_row()
        .with(SaqColumn::City, "Berkeley")
        .with(SaqColumn::LicenseType, "Retail, Transport")
        .with(SaqColumn::Vertical, "Indoor")
        .with(SaqColumn::Permit, "Events");
    let Err(ResolveError::Unresolved(issues)) = resolve_references(&row, &store) else {
        panic!("expected unresolved references");
    };
    assert_eq!(issues.len(), 4);
    assert!(matches!(issues[0], ContentIssue::UnknownLocation { .. }));
    assert_eq!(
        issues[1],
        ContentIssue::UnknownLicenseType {
            name: "Transport".into()
        }
    );
    assert_eq!(
        issues[2],
        ContentIssue::UnknownVertical {
            name: "Indoor".into()
        }
    );
    assert_eq!(
        issues[3],
        ContentIssue::UnknownPermit {
            name: "Events".into()
        }
    );
}

#[test]
fn test_org_category_needs_matching_client() {
    let store = catalog();
    let row = add_row().with(SaqColumn::Category, "Security");
    let report = SaqValidator::default()
        .validate_content(&[row], Some(&store))
        .unwrap();
    assert_eq!(
        report.failures[0].issues,
        vec![ContentIssue::UnknownCategory {
            name: "Security".into()
        }]
    );
}

#[test]
fn test_delete_rows_skip_reference_checks() {
    let store = catalog();
    let row = SaqRow::new(0)
        .with(SaqColumn::Action, "delete")
        .with(SaqColumn::PolicyRequirementId, "7")
        .with(SaqColumn::State, "Nowhere");
    let report = SaqValidator::default()
        .validate_content(&[row], Some(&store))
        .unwrap();
    assert!(report.is_valid());
}

#[test]
fn test_report_serializes() {
    let report = SaqValidator::default()
        .validate_content(&[SaqRow::new(0).with(SaqColumn::Action, "update")], None)
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["rows_checked"], 1);
    assert_eq!(json["failures"][0]["index"], 0);
}
