//! Export workbook writing via umya-spreadsheet.

use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;
use umya_spreadsheet::Spreadsheet;

use saq_model::{SAQ_SHEET_NAME, SaqColumn};

use crate::error::{ExportError, Result};
use crate::projector::ExportRow;

/// `SAQs_[<client>_]<state>[_<city>|_<county>]_<MMDDYYYY>.xlsx`
///
/// City wins over county when both are given.
pub fn export_file_name(
    client: &str,
    state: &str,
    city: &str,
    county: &str,
    date: NaiveDate,
) -> String {
    let mut name = String::from("SAQs_");
    let client = client.trim();
    if !client.is_empty() {
        name.push_str(client);
        name.push('_');
    }
    name.push_str(state.trim());
    let (city, county) = (city.trim(), county.trim());
    if !city.is_empty() {
        name.push('_');
        name.push_str(city);
    } else if !county.is_empty() {
        name.push('_');
        name.push_str(county);
    }
    name.push('_');
    name.push_str(&date.format("%m%d%Y").to_string());
    name.push_str(".xlsx");
    name
}

/// Write rows into the first sheet of a template copy, starting below the
/// header row. Without a template a workbook with the template header row is
/// created.
pub fn write_export(path: &Path, rows: &[ExportRow], template: Option<&Path>) -> Result<()> {
    let mut book = match template {
        Some(template) => umya_spreadsheet::reader::xlsx::read(template).map_err(|e| {
            ExportError::Template {
                path: template.to_path_buf(),
                message: e.to_string(),
            }
        })?,
        None => blank_template(path)?,
    };

    let sheet = book.get_sheet_mut(&0).ok_or_else(|| ExportError::Template {
        path: template.map(Path::to_path_buf).unwrap_or_default(),
        message: "workbook has no sheets".to_string(),
    })?;
    for (row_idx, row) in rows.iter().enumerate() {
        let row_number = sheet_index(row_idx + 2);
        for (col_idx, value) in row.cells().iter().enumerate() {
            let cell = sheet.get_cell_mut((sheet_index(col_idx + 1), row_number));
            let numeric = matches!(
                SaqColumn::ALL.get(col_idx),
                Some(SaqColumn::PolicyRequirementId | SaqColumn::QuestionOrder)
            );
            match value.parse::<i64>() {
                Ok(number) if numeric => {
                    cell.set_value_number(number as f64);
                }
                _ => {
                    cell.set_value_string(value.as_str());
                }
            }
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    umya_spreadsheet::writer::xlsx::write(&book, path).map_err(|e| ExportError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), rows = rows.len(), "wrote export");
    Ok(())
}

fn blank_template(path: &Path) -> Result<Spreadsheet> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_mut(&0).ok_or_else(|| ExportError::Write {
        path: path.to_path_buf(),
        message: "failed to create worksheet".to_string(),
    })?;
    sheet.set_name(SAQ_SHEET_NAME);
    for (col_idx, column) in SaqColumn::ALL.iter().enumerate() {
        sheet
            .get_cell_mut((sheet_index(col_idx + 1), 1))
            .set_value_string(column.header());
    }
    Ok(book)
}

fn sheet_index(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
