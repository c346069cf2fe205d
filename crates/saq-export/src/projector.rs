//! Stored requirements to questionnaire rows.

use tracing::debug;

use saq_model::{
    ComplianceLevel, LocationKey, PolicyCompliance, RequirementRecord, SaqColumn, yes_no,
};
use saq_store::ExportSource;

use crate::error::Result;

/// Number of cells in an exported row; one per template column.
pub const EXPORT_WIDTH: usize = SaqColumn::ALL.len();

/// Whose requirements an export covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportScope {
    pub location: LocationKey,
    /// Client name written for requirements without an owning organization.
    pub client_name: String,
    /// Restrict to this organization's requirements plus the global ones.
    pub organization_id: Option<i64>,
}

/// One exported questionnaire row, cells in template column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    cells: Vec<String>,
}

impl ExportRow {
    fn new() -> Self {
        Self {
            cells: Vec::with_capacity(EXPORT_WIDTH),
        }
    }

    fn push(&mut self, value: impl Into<String>) {
        self.cells.push(value.into());
    }

    fn pad(&mut self) {
        self.cells.resize(EXPORT_WIDTH, String::new());
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn get(&self, column: SaqColumn) -> &str {
        SaqColumn::ALL
            .iter()
            .position(|c| *c == column)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Read every active requirement in scope and lay it out as template rows.
///
/// The action column is always left empty, so an exported sheet re-ingests
/// as a no-op until someone fills it in.
pub fn project_rows<S: ExportSource + ?Sized>(
    source: &S,
    scope: &ExportScope,
) -> Result<Vec<ExportRow>> {
    let records = source.requirements_for_location(&scope.location, scope.organization_id)?;
    debug!(location = %scope.location, requirements = records.len(), "projecting requirements");
    records
        .iter()
        .map(|record| project_record(source, scope, record))
        .collect()
}

fn project_record<S: ExportSource + ?Sized>(
    source: &S,
    scope: &ExportScope,
    record: &RequirementRecord,
) -> Result<ExportRow> {
    let requirement = &record.requirement;
    let mut row = ExportRow::new();

    row.push(record.id.to_string());
    let owner = match requirement.organization_id {
        Some(org) if org > 0 => source.organization_name(org)?.unwrap_or_default(),
        _ => scope.client_name.clone(),
    };
    row.push(owner);
    row.push(record.location.city.as_str());
    row.push(record.location.county.as_str());
    row.push(record.location.state.as_str());
    row.push(requirement.code.as_str());
    row.push(requirement.chapter.as_str());
    row.push(requirement.section.as_str());
    row.push(requirement.regulation.as_str());
    row.push(record.category.as_str());
    row.push(
        requirement
            .question_order
            .map(|order| order.to_string())
            .unwrap_or_default(),
    );

    let compliances = source.policy_compliances(record.id)?;
    if compliances.is_empty() {
        row.pad();
        return Ok(row);
    }
    push_compliances(&mut row, &compliances);

    row.push(requirement.user_facing_note.as_str());
    row.push(source.license_type_names(record.id)?.join(", "));
    let verticals = source.vertical_names(record.id)?;
    row.push(verticals.join(", "));
    row.push(requirement.applicability.label());
    row.push(source.permit_names(record.id)?.join(", "));
    let techniques = if verticals.is_empty() {
        Vec::new()
    } else {
        source.technique_names(record.id)?
    };
    row.push(techniques.join(", "));
    row.push("");

    row.pad();
    Ok(row)
}

/// Primary question, answer and action, then either the secondary block or
/// four empty cells.
fn push_compliances(row: &mut ExportRow, compliances: &[PolicyCompliance]) {
    let primary = compliances
        .iter()
        .find(|c| c.level == ComplianceLevel::Primary);
    let secondary = compliances
        .iter()
        .find(|c| c.level == ComplianceLevel::Secondary);

    match primary {
        Some(record) => {
            row.push(record.question.as_str());
            row.push(yes_no(!record.non_compliant));
            row.push(record.action.as_str());
        }
        None => {
            for _ in 0..3 {
                row.push("");
            }
        }
    }
    match secondary {
        Some(record) => {
            row.push(record.trigger_response.as_str());
            row.push(record.question.as_str());
            row.push(yes_no(!record.non_compliant));
            row.push(record.action.as_str());
        }
        None => {
            for _ in 0..4 {
                row.push("");
            }
        }
    }
}
