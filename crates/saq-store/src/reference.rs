//! Reference vocabulary seeding.
//!
//! Vocabularies are described in TOML:
//!
//! ```toml
//! organizations = ["Acme"]
//!
//! [[locations]]
//! city = "Oakland"
//! state = "CA"
//!
//! [[categories]]
//! name = "Security"
//!
//! [[license_types]]
//! name = "Retail"
//! permits = ["Delivery"]
//!
//! [[license_types.verticals]]
//! name = "Storefront"
//! techniques = ["Walk-in"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use saq_model::LocationKey;

use crate::error::{Result, StoreError};
use crate::traits::ReferenceWriter;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub locations: Vec<LocationKey>,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub license_types: Vec<LicenseTypeSeed>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    /// Owning organization. Absent for global categories.
    #[serde(default)]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseTypeSeed {
    pub name: String,
    #[serde(default)]
    pub verticals: Vec<VerticalSeed>,
    #[serde(default)]
    pub permits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerticalSeed {
    pub name: String,
    #[serde(default)]
    pub techniques: Vec<String>,
}

/// Number of vocabulary entries visited by a seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub locations: usize,
    pub organizations: usize,
    pub categories: usize,
    pub license_types: usize,
    pub verticals: usize,
    pub permits: usize,
    pub techniques: usize,
}

impl ReferenceData {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| StoreError::ReferenceData {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text).map_err(|message| StoreError::ReferenceData {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml_str(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

/// Load every vocabulary entry into a store. Entries that already exist are
/// reused, so seeding twice is harmless.
pub fn seed<W: ReferenceWriter + ?Sized>(store: &mut W, data: &ReferenceData) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for location in &data.locations {
        store.insert_location(location)?;
        summary.locations += 1;
    }
    for organization in &data.organizations {
        store.insert_organization(organization.trim())?;
        summary.organizations += 1;
    }
    for category in &data.categories {
        let organization_id = match category.organization.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(store.insert_organization(name)?),
            _ => None,
        };
        store.insert_audit_category(category.name.trim(), organization_id)?;
        summary.categories += 1;
    }
    for license_type in &data.license_types {
        let license_type_id = store.insert_license_type(license_type.name.trim())?;
        summary.license_types += 1;
        for vertical in &license_type.verticals {
            let vertical_id =
                store.insert_license_type_vertical(license_type_id, vertical.name.trim())?;
            summary.verticals += 1;
            for technique in &vertical.techniques {
                store.insert_vertical_technique(vertical_id, technique.trim())?;
                summary.techniques += 1;
            }
        }
        for permit in &license_type.permits {
            store.insert_license_type_permit(license_type_id, permit.trim())?;
            summary.permits += 1;
        }
    }

    info!(
        locations = summary.locations,
        organizations = summary.organizations,
        categories = summary.categories,
        license_types = summary.license_types,
        "seeded reference data"
    );
    Ok(summary)
}
