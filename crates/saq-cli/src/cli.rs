//! CLI argument definitions for the `saq` tool.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Args, ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use saq_cli::logging::{LogConfig, LogFormat};

#[derive(Parser)]
#[command(
    name = "saq",
    version,
    about = "Ingest and export SAQ policy requirement workbooks",
    long_about = "Validate SAQ questionnaire workbooks and apply their add/update/delete\n\
                  rows to the policy requirement database, or export a location's\n\
                  requirements back into a workbook."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML). Flags override its values.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long, value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate workbooks and apply their rows to the database.
    Ingest(IngestArgs),

    /// Validate workbooks and verify stored compliance records without
    /// writing anything.
    Check(CheckArgs),

    /// Export a location's requirements to a workbook.
    Export(ExportArgs),

    /// Create the database schema and optionally load reference data.
    InitDb(InitDbArgs),
}

/// Exactly one of `--file` or `--dir`.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// A single workbook.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Every `.xlsx` workbook in a directory, in file name order.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Pre-check each file first and skip files that fail it.
    #[arg(long)]
    pub check: bool,

    /// Write the run report as JSON.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Expected worksheet name.
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheet_name: Option<String>,

    /// Keep a requirement when one of its dependents fails instead of rolling
    /// the row back.
    #[arg(long = "no-atomic-rows")]
    pub no_atomic_rows: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write the check report as JSON.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Expected worksheet name.
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheet_name: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    #[arg(long)]
    pub state: String,

    #[arg(long, default_value = "")]
    pub city: String,

    #[arg(long, default_value = "")]
    pub county: String,

    /// Organization to export for; its own requirements plus global ones.
    #[arg(long, default_value = "")]
    pub client: String,

    /// Output directory.
    #[arg(long = "out", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Workbook to copy and fill instead of a blank template.
    #[arg(long, value_name = "PATH")]
    pub template: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitDbArgs {
    /// Reference vocabularies (TOML) to load.
    #[arg(long, value_name = "PATH")]
    pub reference: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}

impl Cli {
    /// Logging setup for this invocation.
    ///
    /// `--log-level` beats `-v`/`-q`, and either one turns off `RUST_LOG`.
    /// ANSI colour is only used on an interactive stderr.
    pub fn log_config(&self) -> LogConfig {
        let explicit_level = self.verbosity.is_present() || self.log_level.is_some();
        let with_ansi = match self.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.log_file.is_none() && io::stderr().is_terminal(),
        };
        LogConfig {
            level_filter: self
                .log_level
                .map_or_else(|| self.verbosity.tracing_level_filter(), LevelFilter::from),
            use_env_filter: !explicit_level,
            with_ansi,
            format: self.log_format.into(),
            log_file: self.log_file.clone(),
            ..LogConfig::default()
        }
    }
}
