//! SAQ export.
//!
//! Reads the requirements stored for a location and writes them back out as a
//! questionnaire workbook that the ingest path accepts.

pub mod error;
pub mod projector;
pub mod writer;

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use saq_model::LocationKey;
use saq_store::ExportSource;

pub use error::{ExportError, Result};
pub use projector::{EXPORT_WIDTH, ExportRow, ExportScope, project_rows};
pub use writer::{export_file_name, write_export};

/// What to export and where.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub location: LocationKey,
    /// Organization name; empty exports global requirements with a blank
    /// client column.
    pub client: String,
    pub out_dir: PathBuf,
    pub template: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

/// Export a location's requirements to a dated workbook in `out_dir`.
///
/// Returns `None` without writing anything when the location has no active
/// requirements.
pub fn export_location<S: ExportSource + ?Sized>(
    source: &S,
    request: &ExportRequest,
    date: NaiveDate,
) -> Result<Option<ExportSummary>> {
    if source.find_location(&request.location)?.is_none() {
        return Err(ExportError::UnknownLocation {
            location: request.location.to_string(),
        });
    }
    let client = request.client.trim();
    let organization_id = if client.is_empty() {
        None
    } else {
        Some(
            source
                .find_organization(client)?
                .ok_or_else(|| ExportError::UnknownOrganization {
                    name: client.to_string(),
                })?,
        )
    };

    let scope = ExportScope {
        location: request.location.clone(),
        client_name: client.to_string(),
        organization_id,
    };
    let rows = project_rows(source, &scope)?;
    if rows.is_empty() {
        warn!(location = %request.location, "no requirements to export");
        return Ok(None);
    }

    let file_name = export_file_name(
        client,
        &request.location.state,
        &request.location.city,
        &request.location.county,
        date,
    );
    let path = request.out_dir.join(file_name);
    write_export(&path, &rows, request.template.as_deref())?;
    info!(path = %path.display(), rows = rows.len(), "exported requirements");
    Ok(Some(ExportSummary {
        path,
        rows: rows.len(),
    }))
}
