use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::columns::SaqColumn;
use crate::entities::RequirementId;
use crate::enums::RowAction;

/// One questionnaire row keyed by template column.
///
/// Every column reads as a string; a column that was absent or empty in the
/// sheet reads as `""`, never as a missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaqRow {
    /// Zero-based data row index (the header row is not counted).
    pub index: usize,
    source_row: usize,
    values: BTreeMap<SaqColumn, String>,
}

impl SaqRow {
    /// A row sitting at `index` directly under a header on sheet row 1.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            source_row: index + 2,
            values: BTreeMap::new(),
        }
    }

    /// Record where the row sits in the source sheet.
    #[must_use]
    pub fn at_sheet_row(mut self, sheet_row: usize) -> Self {
        self.source_row = sheet_row;
        self
    }

    /// Builder-style setter, mostly useful for tests and fixtures.
    #[must_use]
    pub fn with(mut self, column: SaqColumn, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: SaqColumn, value: impl Into<String>) {
        self.values.insert(column, value.into());
    }

    /// Raw cell text, untrimmed.
    pub fn get(&self, column: SaqColumn) -> &str {
        self.values.get(&column).map(String::as_str).unwrap_or("")
    }

    /// Trimmed cell text.
    pub fn trimmed(&self, column: SaqColumn) -> &str {
        self.get(column).trim()
    }

    pub fn is_blank(&self, column: SaqColumn) -> bool {
        self.trimmed(column).is_empty()
    }

    /// Comma-separated list cell, trimmed, with empty entries dropped.
    pub fn list(&self, column: SaqColumn) -> Vec<&str> {
        self.get(column)
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }

    pub fn action(&self) -> Option<RowAction> {
        RowAction::parse(self.get(SaqColumn::Action))
    }

    pub fn requirement_id(&self) -> Option<RequirementId> {
        self.trimmed(SaqColumn::PolicyRequirementId).parse().ok()
    }

    /// 1-based row number in the source sheet, counting the header row.
    pub fn sheet_row(&self) -> usize {
        self.source_row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_reads_empty() {
        let row = SaqRow::new(0);
        assert_eq!(row.get(SaqColumn::Permit), "");
        assert!(row.is_blank(SaqColumn::Permit));
    }

    #[test]
    fn test_list_cell() {
        let row = SaqRow::new(0).with(SaqColumn::LicenseType, " Retail, ,Cultivation ,");
        assert_eq!(row.list(SaqColumn::LicenseType), vec!["Retail", "Cultivation"]);
    }

    #[test]
    fn test_action_and_id() {
        let row = SaqRow::new(3)
            .with(SaqColumn::Action, " Delete ")
            .with(SaqColumn::PolicyRequirementId, "15");
        assert_eq!(row.action(), Some(RowAction::Delete));
        assert_eq!(row.requirement_id().map(|id| id.get()), Some(15));
        assert_eq!(row.sheet_row(), 5);
        assert_eq!(row.at_sheet_row(9).sheet_row(), 9);
    }
}
