//! SAQ command-line tool.

use clap::Parser;

use saq_cli::config::SaqConfig;
use saq_cli::logging::init_logging;
use saq_cli::summary::{print_batch_summary, print_export_summary, print_seed_summary};

mod cli;
mod commands;

use crate::cli::{Cli, Command};
use crate::commands::{run_check, run_export, run_ingest, run_init_db};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&cli.log_config()) {
        eprintln!("error: cannot set up logging: {error}");
        std::process::exit(1);
    }
    let code = run(&cli).unwrap_or_else(|error| {
        eprintln!("error: {error:#}");
        1
    });
    std::process::exit(code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let mut config = SaqConfig::load_or_default(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    match &cli.command {
        Command::Ingest(args) => {
            let report = run_ingest(args, &config)?;
            print_batch_summary(&report);
            Ok(if report.passed() { 0 } else { 1 })
        }
        Command::Check(args) => {
            let report = run_check(args, &config)?;
            print_batch_summary(&report);
            Ok(if report.passed() { 0 } else { 1 })
        }
        Command::Export(args) => {
            let summary = run_export(args, &config)?;
            print_export_summary(summary.as_ref());
            Ok(0)
        }
        Command::InitDb(args) => {
            let summary = run_init_db(args, &config)?;
            print_seed_summary(summary.as_ref());
            Ok(0)
        }
    }
}
