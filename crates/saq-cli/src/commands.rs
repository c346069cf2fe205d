use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, info_span, warn};

use saq_core::{
    BatchDriver, BatchReport, FileReport, RequirementMutator, list_workbooks,
};
use saq_export::{ExportRequest, ExportSummary, export_location};
use saq_model::LocationKey;
use saq_store::{ReferenceData, SeedSummary, SqliteStore, seed};
use saq_validate::SaqValidator;

use saq_cli::config::SaqConfig;

use crate::cli::{CheckArgs, ExportArgs, IngestArgs, InitDbArgs, InputArgs};

pub fn run_ingest(args: &IngestArgs, config: &SaqConfig) -> Result<BatchReport> {
    let span = info_span!("ingest");
    let _guard = span.enter();
    let start = Instant::now();

    let mut driver = build_driver(
        config,
        args.sheet_name.as_deref(),
        config.atomic_rows && !args.no_atomic_rows,
    )?;
    let mut batch = BatchReport::default();
    for path in input_files(&args.input)? {
        if args.check {
            let precheck = driver
                .check_file(&path)
                .unwrap_or_else(|err| FileReport::failed(&path, &err));
            if !precheck.passed() {
                warn!(file = %path.display(), "pre-check failed, skipping file");
                batch.files.push(precheck);
                continue;
            }
        }
        let report = driver
            .process_file(&path)
            .unwrap_or_else(|err| FileReport::failed(&path, &err));
        batch.files.push(report);
    }

    let totals = batch.totals();
    info!(
        files = batch.files.len(),
        added = totals.added,
        updated = totals.updated,
        deleted = totals.deleted,
        duration_ms = start.elapsed().as_millis(),
        "ingest complete"
    );
    write_report(args.report.as_deref(), &batch)?;
    Ok(batch)
}

pub fn run_check(args: &CheckArgs, config: &SaqConfig) -> Result<BatchReport> {
    let span = info_span!("check");
    let _guard = span.enter();
    let start = Instant::now();

    let mut driver = build_driver(config, args.sheet_name.as_deref(), config.atomic_rows)?;
    let mut batch = BatchReport::default();
    for path in input_files(&args.input)? {
        let report = driver
            .check_file(&path)
            .unwrap_or_else(|err| FileReport::failed(&path, &err));
        batch.files.push(report);
    }

    info!(
        files = batch.files.len(),
        duration_ms = start.elapsed().as_millis(),
        "check complete"
    );
    write_report(args.report.as_deref(), &batch)?;
    Ok(batch)
}

pub fn run_export(args: &ExportArgs, config: &SaqConfig) -> Result<Option<ExportSummary>> {
    let span = info_span!("export", state = %args.state);
    let _guard = span.enter();

    let store = open_store(&config.database)?;
    let request = ExportRequest {
        location: LocationKey::new(args.city.as_str(), args.county.as_str(), args.state.as_str()),
        client: args.client.clone(),
        out_dir: args
            .out_dir
            .clone()
            .unwrap_or_else(|| config.export_dir.clone()),
        template: args.template.clone().or_else(|| config.template.clone()),
    };
    export_location(&store, &request, Local::now().date_naive())
        .with_context(|| format!("export requirements for {}", request.location))
}

pub fn run_init_db(args: &InitDbArgs, config: &SaqConfig) -> Result<Option<SeedSummary>> {
    let mut store = open_store(&config.database)?;
    let Some(path) = &args.reference else {
        info!(database = %config.database.display(), "schema applied");
        return Ok(None);
    };
    let data = ReferenceData::load(path).context("load reference data")?;
    let summary = seed(&mut store, &data).context("seed reference data")?;
    info!(database = %config.database.display(), reference = %path.display(), "reference data loaded");
    Ok(Some(summary))
}

fn build_driver(
    config: &SaqConfig,
    sheet_name: Option<&str>,
    atomic_rows: bool,
) -> Result<BatchDriver<SqliteStore>> {
    let store = open_store(&config.database)?;
    let validator = SaqValidator::new(sheet_name.unwrap_or(&config.sheet_name));
    Ok(BatchDriver::new(
        RequirementMutator::new(store).with_atomic_rows(atomic_rows),
        validator,
        config.archive_layout(),
    ))
}

fn open_store(path: &Path) -> Result<SqliteStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }
    SqliteStore::open(path).with_context(|| format!("open database {}", path.display()))
}

fn input_files(input: &InputArgs) -> Result<Vec<PathBuf>> {
    match (&input.file, &input.dir) {
        (Some(file), _) => Ok(vec![file.clone()]),
        (None, Some(dir)) => {
            list_workbooks(dir).with_context(|| format!("list workbooks in {}", dir.display()))
        }
        (None, None) => Ok(Vec::new()),
    }
}

fn write_report(path: Option<&Path>, batch: &BatchReport) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(batch).context("serialize report")?;
    std::fs::write(path, json).with_context(|| format!("write report {}", path.display()))?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}
