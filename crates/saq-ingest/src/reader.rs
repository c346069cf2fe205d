//! Workbook reading via calamine.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::table::{SheetTable, Workbook};

/// Read every worksheet of a workbook as text.
///
/// The first row of each sheet's used range becomes the header row. Cells are
/// rendered as text; empty cells become `""`. Blank data rows are dropped, but
/// every kept row remembers the sheet row it came from.
pub fn read_workbook(path: &Path) -> Result<Workbook> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| IngestError::WorkbookRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| IngestError::SheetRead {
                path: path.to_path_buf(),
                sheet: name.clone(),
                message: e.to_string(),
            })?;

        let header_row = range.start().map_or(1, |(row, _)| row as usize + 1);
        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default();
        let mut table = SheetTable::new(name.clone(), headers);
        for (offset, row) in rows.enumerate() {
            let cells: Vec<String> = row.iter().map(cell_text).collect();
            if cells.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            table.push_sheet_row(header_row + offset + 1, cells);
        }
        debug!(
            path = %path.display(),
            sheet = %name,
            rows = table.height(),
            "read worksheet"
        );
        sheets.push(table);
    }

    Ok(Workbook::new(sheets))
}

/// Read one named sheet.
pub fn read_sheet(path: &Path, sheet: &str) -> Result<SheetTable> {
    read_workbook(path)?.into_sheet(sheet)
}

/// Render a cell as the text a user would see in the sheet.
///
/// Whole floats lose their fractional part so ids typed as numbers read back
/// as `12`, not `12.0`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Float(12.0)), "12");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::String(" Yes ".into())), " Yes ");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
    }

    #[test]
    fn test_missing_file() {
        let err = read_workbook(Path::new("/nonexistent/saq.xlsx")).unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound { .. }));
    }
}
