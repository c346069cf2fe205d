//! Questionnaire workbook ingestion.
//!
//! Reads xlsx workbooks into text tables, maps their headers onto the SAQ
//! column catalog, and writes annotated tables back out.

pub mod error;
pub mod reader;
pub mod rename;
pub mod table;
pub mod writer;

pub use error::{IngestError, Result};
pub use reader::{cell_text, read_sheet, read_workbook};
pub use rename::{present_columns, rename_sheet_columns, resolve_headers};
pub use table::{SheetTable, Workbook, normalize_header};
pub use writer::write_sheet_table;
