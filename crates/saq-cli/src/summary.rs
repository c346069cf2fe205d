//! Human-readable run summaries.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use saq_core::{BatchReport, FileReport, FileStatus, RowTotals};
use saq_export::ExportSummary;
use saq_store::SeedSummary;

pub fn print_batch_summary(report: &BatchReport) {
    if report.files.is_empty() {
        println!("No workbooks found.");
        return;
    }
    println!("{}", batch_table(report));
    if let Some(table) = issue_table(report) {
        println!();
        println!("Issues:");
        println!("{table}");
    }
    for file in &report.files {
        if let Some(path) = &file.error_artifact {
            println!("Error workbook: {}", path.display());
        }
        if let Some(path) = &file.archived_to {
            println!("Archived: {}", path.display());
        }
    }
    println!("{}", banner(report));
}

pub fn print_export_summary(summary: Option<&ExportSummary>) {
    match summary {
        Some(summary) => println!(
            "Exported {} requirement(s) to {}",
            summary.rows,
            summary.path.display()
        ),
        None => println!("No requirements found for that location; nothing exported."),
    }
}

pub fn print_seed_summary(summary: Option<&SeedSummary>) {
    let Some(summary) = summary else {
        println!("Database schema is up to date.");
        return;
    };
    let mut table = grid(&["Vocabulary", "Entries"], ContentArrangement::Dynamic, 80);
    right_align(&mut table, 1..2);
    for (name, count) in [
        ("Locations", summary.locations),
        ("Organizations", summary.organizations),
        ("Categories", summary.categories),
        ("License types", summary.license_types),
        ("Verticals", summary.verticals),
        ("Permits", summary.permits),
        ("Techniques", summary.techniques),
    ] {
        table.add_row(vec![Cell::new(name), Cell::new(count)]);
    }
    println!("{table}");
}

/// One row per file plus a total row.
pub fn batch_table(report: &BatchReport) -> Table {
    let mut table = grid(
        &[
            "File", "Status", "Added", "Updated", "Deleted", "Skipped", "Partial", "Failed",
        ],
        ContentArrangement::Dynamic,
        140,
    );
    right_align(&mut table, 2..8);

    for file in &report.files {
        let totals = file.totals();
        let mut row = vec![Cell::new(file_name(file)), status_cell(&file.status)];
        row.extend(count_cells(&totals));
        table.add_row(row);
    }
    let totals = report.totals();
    let mut row = vec![
        emphasis("TOTAL", Color::Cyan),
        dim_cell(format!("{} file(s)", report.files.len())),
    ];
    row.extend(
        count_cells(&totals)
            .into_iter()
            .map(|cell| cell.add_attribute(Attribute::Bold)),
    );
    table.add_row(row);
    table
}

/// Content issues and missing compliance records, one row per problem.
pub fn issue_table(report: &BatchReport) -> Option<Table> {
    let mut table = grid(
        &["File", "Row", "Column", "Issue"],
        ContentArrangement::DynamicFullWidth,
        160,
    );
    right_align(&mut table, 1..2);

    let mut rows = 0usize;
    for file in &report.files {
        let name = file_name(file);
        if let Some(content) = &file.content {
            for failure in &content.failures {
                for issue in &failure.issues {
                    table.add_row(vec![
                        Cell::new(&name),
                        Cell::new(failure.sheet_row),
                        Cell::new(issue.column().header()),
                        Cell::new(issue.to_string()),
                    ]);
                    rows += 1;
                }
            }
        }
        for missing in &file.missing_compliance {
            table.add_row(vec![
                Cell::new(&name),
                Cell::new(missing.sheet_row),
                dim_cell("-"),
                Cell::new(format!(
                    "level {} compliance record for requirement {} not found",
                    missing.level, missing.requirement_id
                )),
            ]);
            rows += 1;
        }
        if let FileStatus::Failed { error } | FileStatus::Aborted { error, .. } = &file.status {
            table.add_row(vec![
                Cell::new(&name),
                dim_cell("-"),
                dim_cell("-"),
                Cell::new(error).fg(Color::Red),
            ]);
            rows += 1;
        }
    }
    (rows > 0).then_some(table)
}

/// Final pass/fail line.
pub fn banner(report: &BatchReport) -> String {
    let failed = report.files.iter().filter(|file| !file.passed()).count();
    if failed == 0 {
        format!("PASS: {} file(s) processed", report.files.len())
    } else {
        format!(
            "FAIL: {failed} of {} file(s) did not complete",
            report.files.len()
        )
    }
}

pub fn status_label(status: &FileStatus) -> String {
    match status {
        FileStatus::Completed => "completed".to_string(),
        FileStatus::MissingSheet { expected } => format!("missing sheet '{expected}'"),
        FileStatus::MissingColumns { missing } => {
            format!("missing columns: {}", missing.join(", "))
        }
        FileStatus::InvalidContent { failed_rows } => {
            format!("invalid content ({failed_rows} row(s))")
        }
        FileStatus::ComplianceMissing { rows } => {
            format!("compliance missing ({rows} row(s))")
        }
        FileStatus::Aborted { row, .. } => format!("aborted at row {row}"),
        FileStatus::Failed { .. } => "failed".to_string(),
    }
}

/// Rounded UTF-8 grid with bold cyan headers.
fn grid(headers: &[&str], arrangement: ContentArrangement, width: u16) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(arrangement)
        .set_width(width)
        .set_header(headers.iter().map(|label| emphasis(label, Color::Cyan)));
    table
}

fn right_align(table: &mut Table, columns: std::ops::Range<usize>) {
    for index in columns {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn count_cells(totals: &RowTotals) -> Vec<Cell> {
    vec![
        count_cell(totals.added, Color::Green),
        count_cell(totals.updated, Color::Green),
        count_cell(totals.deleted, Color::Green),
        count_cell(totals.skipped, Color::Yellow),
        count_cell(totals.partial, Color::Yellow),
        count_cell(totals.rolled_back + totals.not_committed, Color::Red),
    ]
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn status_cell(status: &FileStatus) -> Cell {
    let label = status_label(status);
    match status {
        FileStatus::Completed => emphasis(label, Color::Green),
        FileStatus::ComplianceMissing { .. } => Cell::new(label).fg(Color::Yellow),
        _ => emphasis(label, Color::Red),
    }
}

fn file_name(file: &FileReport) -> String {
    file.file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.file.display().to_string())
}

fn emphasis<T: ToString>(value: T, color: Color) -> Cell {
    Cell::new(value).fg(color).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
