//! In-memory worksheet tables.

use crate::error::{IngestError, Result};

/// A worksheet read as text: one header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based sheet row of each entry in `rows`, filled in by the reader.
    pub sheet_rows: Vec<usize>,
}

impl SheetTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
            sheet_rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_row(mut self, row: Vec<String>) -> Self {
        self.rows.push(row);
        self
    }

    /// Append a data row read from `sheet_row` of the source sheet.
    pub fn push_sheet_row(&mut self, sheet_row: usize, cells: Vec<String>) {
        self.sheet_rows.push(sheet_row);
        self.rows.push(cells);
    }

    /// Sheet row a data row came from. Rows without a recorded position
    /// count from directly under a header on row 1.
    pub fn sheet_row(&self, index: usize) -> usize {
        self.sheet_rows.get(index).copied().unwrap_or(index + 2)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Trim whitespace around every header.
    pub fn normalize_headers(&mut self) {
        for header in &mut self.headers {
            *header = normalize_header(header);
        }
    }

    /// Remove a column and its cells. Returns whether the column existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.headers.remove(idx);
        for row in &mut self.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
        true
    }

    /// Pad short rows so every row has one cell per header; absent cells
    /// become empty strings.
    pub fn fill_missing(&mut self) {
        let width = self.headers.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
    }

    /// Cell text by row index and header, `""` when absent.
    pub fn cell(&self, row: usize, column: &str) -> &str {
        let Some(idx) = self.column_index(column) else {
            return "";
        };
        self.rows
            .get(row)
            .and_then(|cells| cells.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Normalizes a header value by trimming whitespace and a leading BOM.
pub fn normalize_header(value: &str) -> String {
    value.trim().trim_matches('\u{feff}').trim().to_string()
}

/// All worksheets of one workbook, in workbook order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<SheetTable>,
}

impl Workbook {
    pub fn new(sheets: Vec<SheetTable>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetTable> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Take ownership of one sheet.
    pub fn into_sheet(self, name: &str) -> Result<SheetTable> {
        self.sheets
            .into_iter()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| IngestError::SheetNotFound {
                sheet: name.to_string(),
            })
    }
}
