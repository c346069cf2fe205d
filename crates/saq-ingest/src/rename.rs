//! Mapping sheet headers onto the template column catalog.

use saq_model::{SaqColumn, SaqRow};

use crate::table::SheetTable;

/// Resolve each header of a sheet to a template column, position by position.
///
/// Unknown headers resolve to `None`. When two headers resolve to the same
/// column the first one wins.
pub fn resolve_headers(headers: &[String]) -> Vec<Option<SaqColumn>> {
    let mut seen = Vec::new();
    headers
        .iter()
        .map(|header| {
            let column = SaqColumn::from_header(header)?;
            if seen.contains(&column) {
                return None;
            }
            seen.push(column);
            Some(column)
        })
        .collect()
}

/// Template columns present in a header row.
pub fn present_columns(headers: &[String]) -> Vec<SaqColumn> {
    resolve_headers(headers).into_iter().flatten().collect()
}

/// Convert sheet rows into keyed questionnaire rows.
///
/// Columns outside the catalog are ignored; catalog columns missing from the
/// sheet read as `""`.
pub fn rename_sheet_columns(table: &SheetTable) -> Vec<SaqRow> {
    let columns = resolve_headers(&table.headers);
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, cells)| {
            let mut row = SaqRow::new(index).at_sheet_row(table.sheet_row(index));
            for (column, cell) in columns.iter().zip(cells) {
                if let Some(column) = column {
                    row.set(*column, cell.clone());
                }
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_resolve_headers_first_wins() {
        let headers = strings(&["Action", "Notes", "action", "Client Name"]);
        assert_eq!(
            resolve_headers(&headers),
            vec![
                Some(SaqColumn::Action),
                None,
                None,
                Some(SaqColumn::Organization)
            ]
        );
    }

    #[test]
    fn test_rename_sheet_columns() {
        let table = SheetTable::new("SAQs", strings(&["State", "Comments", "Action"]))
            .with_row(strings(&["CA", "ignored", " add "]))
            .with_row(strings(&["NV"]));
        let rows = rename_sheet_columns(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(SaqColumn::State), "CA");
        assert_eq!(rows[0].get(SaqColumn::Action), " add ");
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[1].sheet_row(), 3);
        assert_eq!(rows[1].get(SaqColumn::Action), "");
        assert_eq!(rows[1].get(SaqColumn::Permit), "");
    }
}
