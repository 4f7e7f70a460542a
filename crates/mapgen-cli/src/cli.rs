//! CLI argument definitions for the mapping context builder.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use mapgen_model::DataCaptureMode;

#[derive(Parser)]
#[command(
    name = "mapgen",
    version,
    about = "Build validated load contexts from a source-to-target mapping workbook",
    long_about = "Build validated load contexts from a source-to-target mapping workbook.\n\n\
                  Reads the table catalog and field-mapping sheets, validates every target\n\
                  table and prints a summary. Built contexts can be written as JSON for\n\
                  the artifact renderers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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
    /// Build every table of a workbook and report the outcome.
    Build(BuildArgs),

    /// List the source-system profiles of a configuration file.
    Sources(SourcesArgs),
}

#[derive(Parser)]
pub struct BuildArgs {
    /// Directory with one CSV file per workbook sheet (catalog.csv, mapping.csv).
    #[arg(value_name = "WORKBOOK_DIR")]
    pub workbook_dir: PathBuf,

    /// Configuration file (default: <WORKBOOK_DIR>/mapgen.toml, then built-in defaults).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// How the source tables are captured.
    #[arg(long = "load-mode", value_enum, default_value = "snapshot")]
    pub load_mode: LoadModeArg,

    /// Field delimiter of the sheet files.
    #[arg(long = "delimiter", default_value_t = ',')]
    pub delimiter: char,

    /// Write built contexts as JSON to this file ("-" for stdout).
    #[arg(long = "json", value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Use deterministic hub short-name suffixes instead of random ones.
    #[arg(long = "stable-names")]
    pub stable_names: bool,
}

#[derive(Parser)]
pub struct SourcesArgs {
    /// Configuration file to inspect.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LoadModeArg {
    Snapshot,
    Increment,
}

impl From<LoadModeArg> for DataCaptureMode {
    fn from(arg: LoadModeArg) -> Self {
        match arg {
            LoadModeArg::Snapshot => DataCaptureMode::Snapshot,
            LoadModeArg::Increment => DataCaptureMode::Increment,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
