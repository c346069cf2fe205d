//! Export projection and workbook writing against the in-memory store.

use chrono::NaiveDate;
use saq_export::{
    ExportError, ExportRequest, ExportRow, ExportScope, export_location, project_rows,
};
use saq_ingest::{SheetTable, read_workbook, write_sheet_table};
use saq_model::{
    Applicability, ComplianceLevel, LocationKey, PolicyCompliance, RequirementId,
    RequirementLicenseType, RequirementPermit, RequirementVertical, SaqColumn, VerticalTechnique,
};
use saq_store::{
    MemoryStore, ReferenceCatalog, ReferenceData, RequirementStore, blank_requirement, seed,
};
use tempfile::TempDir;

const REFERENCE: &str = r#"
organizations = ["Acme", "Globex"]

[[locations]]
city = "Oakland"
state = "CA"

[[locations]]
county = "Alameda"
state = "CA"

[[categories]]
name = "Inventory"

[[license_types]]
name = "Retail"
permits = ["Delivery"]

[[license_types.verticals]]
name = "Storefront"
techniques = ["Walk-in"]
"#;

fn store() -> MemoryStore {
    let mut store = MemoryStore::new();
    seed(&mut store, &ReferenceData::from_toml_str(REFERENCE).unwrap()).unwrap();
    store
}

fn oakland() -> LocationKey {
    LocationKey::new("Oakland", "", "CA")
}

fn compliance(
    id: RequirementId,
    level: ComplianceLevel,
    question: &str,
    non_compliant: bool,
    trigger: &str,
) -> PolicyCompliance {
    PolicyCompliance {
        requirement_id: id,
        question: question.to_string(),
        non_compliant,
        action: format!("Fix {question}"),
        level,
        trigger_response: trigger.to_string(),
    }
}

/// Store a requirement at Oakland, optionally owned by an organization.
fn requirement(store: &mut MemoryStore, order: Option<i64>, owner: Option<&str>) -> RequirementId {
    let location = store.find_location(&oakland()).unwrap().unwrap();
    let category = store.find_audit_category("Inventory", None).unwrap().unwrap();
    let mut requirement = blank_requirement(location, category);
    requirement.code = "BPC 26070".to_string();
    requirement.chapter = "4".to_string();
    requirement.section = "1".to_string();
    requirement.regulation = "a".to_string();
    requirement.question_order = order;
    requirement.organization_id = owner.map(|name| store.find_organization(name).unwrap().unwrap());
    store.create_policy_requirement(&requirement).unwrap()
}

/// Link every Retail vocabulary entry to a requirement.
fn link_all(store: &mut MemoryStore, id: RequirementId) {
    let retail = store.find_license_type("Retail").unwrap().unwrap();
    store
        .add_requirement_license_type(&RequirementLicenseType {
            requirement_id: id,
            license_type_id: retail,
        })
        .unwrap();
    let vertical = store.license_type_verticals(retail).unwrap()[0].id;
    let link = store
        .add_requirement_vertical(&RequirementVertical {
            requirement_id: id,
            license_type_vertical_id: vertical,
        })
        .unwrap();
    let technique = store.vertical_techniques(vertical).unwrap()[0].id;
    store
        .add_vertical_technique(&VerticalTechnique {
            policy_requirement_vertical_id: link,
            license_type_vertical_technique_id: technique,
        })
        .unwrap();
    let permit = store.license_type_permits(retail).unwrap()[0].id;
    store
        .add_requirement_permit(&RequirementPermit {
            requirement_id: id,
            license_type_permit_id: permit,
        })
        .unwrap();
}

/// Every cell after the id, pipe separated.
fn render(row: &ExportRow) -> String {
    row.cells()[1..].join("|")
}

fn scope(client: &str, organization_id: Option<i64>) -> ExportScope {
    ExportScope {
        location: oakland(),
        client_name: client.to_string(),
        organization_id,
    }
}

#[test]
fn test_row_with_secondary_compliance() {
    let mut store = store();
    let id = requirement(&mut store, Some(3), None);
    link_all(&mut store, id);
    store
        .create_policy_compliance(&compliance(id, ComplianceLevel::Primary, "Q1", false, ""))
        .unwrap();
    store
        .create_policy_compliance(&compliance(id, ComplianceLevel::Secondary, "Q2", true, "Yes"))
        .unwrap();

    let rows = project_rows(&store, &scope("", None)).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cells()[0], id.to_string());
    insta::assert_snapshot!(
        render(&rows[0]),
        @"|Oakland||CA|BPC 26070|4|1|a|Inventory|3|Q1|Yes|Fix Q1|Yes|Q2|No|Fix Q2||Retail|Storefront|Both|Delivery|Walk-in|"
    );
}

#[test]
fn test_primary_only_leaves_secondary_block_empty() {
    let mut store = store();
    let id = requirement(&mut store, None, None);
    store
        .create_policy_compliance(&compliance(id, ComplianceLevel::Primary, "Q1", true, ""))
        .unwrap();

    let rows = project_rows(&store, &scope("Walk-up", None)).unwrap();

    insta::assert_snapshot!(
        render(&rows[0]),
        @"Walk-up|Oakland||CA|BPC 26070|4|1|a|Inventory||Q1|No|Fix Q1||||||||Both|||"
    );
}

#[test]
fn test_requirement_without_compliance_is_padded() {
    let mut store = store();
    requirement(&mut store, Some(1), None);

    let rows = project_rows(&store, &scope("", None)).unwrap();

    assert_eq!(rows[0].cells().len(), 25);
    assert_eq!(rows[0].get(SaqColumn::QuestionOrder), "1");
    assert_eq!(rows[0].get(SaqColumn::InitialAuditQuestion), "");
    assert_eq!(rows[0].get(SaqColumn::Applicability), "");
}

#[test]
fn test_applicability_and_ordering() {
    let mut store = store();
    let later = requirement(&mut store, Some(9), None);
    let first = requirement(&mut store, Some(2), None);
    let unordered = requirement(&mut store, None, None);
    for id in [later, first, unordered] {
        store
            .create_policy_compliance(&compliance(id, ComplianceLevel::Primary, "Q", false, ""))
            .unwrap();
    }
    let mut medicinal = store.requirement(first).unwrap().clone();
    medicinal.applicability = Applicability::Medicinal;
    store.update_policy_requirement(first, &medicinal).unwrap();

    let rows = project_rows(&store, &scope("", None)).unwrap();

    let ids: Vec<&str> = rows.iter().map(|r| r.get(SaqColumn::PolicyRequirementId)).collect();
    assert_eq!(
        ids,
        vec![first.to_string(), later.to_string(), unordered.to_string()]
    );
    assert_eq!(rows[0].get(SaqColumn::Applicability), "Medicinal");
    assert_eq!(rows[1].get(SaqColumn::Applicability), "Both");
}

#[test]
fn test_organization_scope() {
    let mut store = store();
    requirement(&mut store, Some(1), None);
    requirement(&mut store, Some(2), Some("Acme"));
    requirement(&mut store, Some(3), Some("Globex"));
    let acme = store.find_organization("Acme").unwrap();

    let rows = project_rows(&store, &scope("Acme", acme)).unwrap();

    let owners: Vec<&str> = rows.iter().map(|r| r.get(SaqColumn::Organization)).collect();
    assert_eq!(owners, vec!["Acme", "Acme"]);
    assert_eq!(project_rows(&store, &scope("", None)).unwrap().len(), 3);
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
}

#[test]
fn test_export_writes_workbook_that_reads_back() {
    let dir = TempDir::new().unwrap();
    let mut store = store();
    let id = requirement(&mut store, Some(4), Some("Acme"));
    link_all(&mut store, id);
    store
        .create_policy_compliance(&compliance(id, ComplianceLevel::Primary, "Q1", false, ""))
        .unwrap();
    let request = ExportRequest {
        location: oakland(),
        client: "Acme".to_string(),
        out_dir: dir.path().join("export"),
        template: None,
    };

    let summary = export_location(&store, &request, date()).unwrap().unwrap();

    assert_eq!(summary.rows, 1);
    assert_eq!(
        summary.path,
        dir.path().join("export").join("SAQs_Acme_CA_Oakland_03092024.xlsx")
    );
    let workbook = read_workbook(&summary.path).unwrap();
    let sheet = workbook.sheet("SAQs").unwrap();
    let expected: Vec<String> = SaqColumn::ALL.iter().map(|c| c.header().to_string()).collect();
    assert_eq!(sheet.headers, expected);
    assert_eq!(sheet.height(), 1);
    assert_eq!(sheet.cell(0, "Policy Requirement ID"), id.to_string());
    assert_eq!(sheet.cell(0, "Client Name"), "Acme");
    assert_eq!(sheet.cell(0, "Question Order"), "4");
    assert_eq!(sheet.cell(0, "Technique"), "Walk-in");
    assert_eq!(sheet.cell(0, "Action"), "");
}

#[test]
fn test_export_into_template() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("template.xlsx");
    let mut headers: Vec<String> = SaqColumn::ALL.iter().map(|c| c.header().to_string()).collect();
    headers[0] = "Requirement".to_string();
    write_sheet_table(&template, &SheetTable::new("SAQs", headers)).unwrap();

    let mut store = store();
    let id = requirement(&mut store, None, None);
    store
        .create_policy_compliance(&compliance(id, ComplianceLevel::Primary, "Q1", false, ""))
        .unwrap();
    let request = ExportRequest {
        location: oakland(),
        client: String::new(),
        out_dir: dir.path().to_path_buf(),
        template: Some(template),
    };

    let summary = export_location(&store, &request, date()).unwrap().unwrap();

    let sheet = read_workbook(&summary.path).unwrap().into_sheet("SAQs").unwrap();
    assert_eq!(sheet.headers[0], "Requirement");
    assert_eq!(sheet.cell(0, "Requirement"), id.to_string());
    assert_eq!(sheet.cell(0, "Initial Audit Response"), "Yes");
}

#[test]
fn test_export_without_requirements_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = store();
    let request = ExportRequest {
        location: LocationKey::new("", "Alameda", "CA"),
        client: String::new(),
        out_dir: dir.path().join("export"),
        template: None,
    };

    assert!(export_location(&store, &request, date()).unwrap().is_none());
    assert!(!dir.path().join("export").exists());
}

#[test]
fn test_export_rejects_unknown_names() {
    let dir = TempDir::new().unwrap();
    let store = store();
    let mut request = ExportRequest {
        location: oakland(),
        client: "Initech".to_string(),
        out_dir: dir.path().to_path_buf(),
        template: None,
    };
    assert!(matches!(
        export_location(&store, &request, date()),
        Err(ExportError::UnknownOrganization { .. })
    ));

    request.client.clear();
    request.location = LocationKey::new("Fresno", "", "CA");
    assert!(matches!(
        export_location(&store, &request, date()),
        Err(ExportError::UnknownLocation { .. })
    ));
}
