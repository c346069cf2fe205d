//! Plain worksheet writing via rust_xlsxwriter.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::table::SheetTable;

/// Write a single table to a new workbook, header row in bold.
///
/// Parent directories are created when missing.
pub fn write_sheet_table(path: &Path, table: &SheetTable) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| IngestError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_err = |e: rust_xlsxwriter::XlsxError| IngestError::WorkbookWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.name).map_err(write_err)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, column_number(col), header, &header_format)
            .map_err(write_err)?;
    }
    for (row_idx, cells) in table.rows.iter().enumerate() {
        let row = u32::try_from(row_idx + 1).unwrap_or(u32::MAX);
        for (col, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet
                .write_string(row, column_number(col), cell)
                .map_err(write_err)?;
        }
    }

    workbook.save(path).map_err(write_err)?;
    debug!(path = %path.display(), rows = table.height(), "wrote worksheet");
    Ok(())
}

fn column_number(col: usize) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}
