//! Resolving a row's reference names to storage ids.
//!
//! Shared by content validation, which reports what fails to resolve, and by
//! the requirement mutator, which links what resolved.

use thiserror::Error;

use saq_model::{LocationKey, NamedRef, SaqColumn, SaqRow};
use saq_store::{ReferenceCatalog, StoreError};

use crate::issue::ContentIssue;

/// A linked vertical and the techniques attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVertical {
    pub license_type_vertical_id: i64,
    pub techniques: Vec<i64>,
}

/// Storage ids for every reference a row names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub location_id: i64,
    pub organization_id: Option<i64>,
    pub category_id: i64,
    pub license_types: Vec<i64>,
    pub verticals: Vec<ResolvedVertical>,
    pub permits: Vec<i64>,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{} unresolved reference(s)", .0.len())]
    Unresolved(Vec<ContentIssue>),
}

impl ResolveError {
    /// Describe the failure on one line, for outcome reasons and logs.
    pub fn describe(&self) -> String {
        match self {
            ResolveError::Store(err) => err.to_string(),
            ResolveError::Unresolved(issues) => issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

pub fn row_location(row: &SaqRow) -> LocationKey {
    LocationKey::new(
        row.get(SaqColumn::City),
        row.get(SaqColumn::County),
        row.get(SaqColumn::State),
    )
}

/// Resolve location, organization, category, license types, verticals,
/// permits and techniques. Every unresolved name is collected before
/// failing.
pub fn resolve_references(
    row: &SaqRow,
    catalog: &(impl ReferenceCatalog + ?Sized),
) -> Result<ResolvedRow, ResolveError> {
    let mut issues = Vec::new();

    let location = row_location(row);
    let location_id = catalog.find_location(&location)?;
    if location_id.is_none() {
        issues.push(ContentIssue::UnknownLocation { location });
    }

    let organization_name = row.trimmed(SaqColumn::Organization);
    let organization_id = if organization_name.is_empty() {
        None
    } else {
        let found = catalog.find_organization(organization_name)?;
        if found.is_none() {
            issues.push(ContentIssue::UnknownOrganization {
                name: organization_name.to_string(),
            });
        }
        found
    };

    let category = row.trimmed(SaqColumn::Category);
    let category_id = catalog.find_audit_category(category, organization_id)?;
    if category_id.is_none() {
        issues.push(ContentIssue::UnknownCategory {
            name: category.to_string(),
        });
    }

    let mut license_types = Vec::new();
    for name in row.list(SaqColumn::LicenseType) {
        match catalog.find_license_type(name)? {
            Some(id) if !license_types.contains(&id) => license_types.push(id),
            Some(_) => {}
            None => issues.push(ContentIssue::UnknownLicenseType {
                name: name.to_string(),
            }),
        }
    }

    let mut offered_verticals: Vec<NamedRef> = Vec::new();
    let mut offered_permits: Vec<NamedRef> = Vec::new();
    for license_type_id in &license_types {
        offered_verticals.extend(catalog.license_type_verticals(*license_type_id)?);
        offered_permits.extend(catalog.license_type_permits(*license_type_id)?);
    }

    let named_verticals = row.list(SaqColumn::Vertical);
    let vertical_ids: Vec<i64> = if named_verticals.is_empty() {
        offered_verticals.iter().map(|v| v.id).collect()
    } else {
        pick(&named_verticals, &offered_verticals, &mut issues, |name| {
            ContentIssue::UnknownVertical { name }
        })
    };

    let mut verticals: Vec<ResolvedVertical> = vertical_ids
        .into_iter()
        .map(|license_type_vertical_id| ResolvedVertical {
            license_type_vertical_id,
            techniques: Vec::new(),
        })
        .collect();
    for name in row.list(SaqColumn::Technique) {
        let mut matched = false;
        for vertical in &mut verticals {
            let techniques = catalog.vertical_techniques(vertical.license_type_vertical_id)?;
            for technique in techniques.iter().filter(|t| t.matches(name)) {
                matched = true;
                if !vertical.techniques.contains(&technique.id) {
                    vertical.techniques.push(technique.id);
                }
            }
        }
        if !matched {
            issues.push(ContentIssue::UnknownTechnique {
                name: name.to_string(),
            });
        }
    }

    let permits = pick(
        &row.list(SaqColumn::Permit),
        &offered_permits,
        &mut issues,
        |name| ContentIssue::UnknownPermit { name },
    );

    match (location_id, category_id) {
        (Some(location_id), Some(category_id)) if issues.is_empty() => Ok(ResolvedRow {
            location_id,
            organization_id,
            category_id,
            license_types,
            verticals,
            permits,
        }),
        _ => Err(ResolveError::Unresolved(issues)),
    }
}

/// Ids of every offered entry matching one of `names`. A name may match
/// entries under several license types.
fn pick(
    names: &[&str],
    offered: &[NamedRef],
    issues: &mut Vec<ContentIssue>,
    unknown: impl Fn(String) -> ContentIssue,
) -> Vec<i64> {
    let mut ids = Vec::new();
    for name in names {
        let matches: Vec<&NamedRef> = offered.iter().filter(|entry| entry.matches(name)).collect();
        if matches.is_empty() {
            issues.push(unknown((*name).to_string()));
        }
        for entry in matches {
            if !ids.contains(&entry.id) {
                ids.push(entry.id);
            }
        }
    }
    ids
}
