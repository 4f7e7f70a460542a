//! Workbook build shared by the `build` command and its tests.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span};

use mapgen_config::{Config, load_config};
use mapgen_core::{
    NameGenerator, RandomNameGenerator, RunOptions, RunReport, SequentialNameGenerator,
    run_from_reader,
};
use mapgen_ingest::CsvWorkbook;
use mapgen_model::{DataCaptureMode, TableMapping};

/// Name of the configuration file looked up next to the workbook sheets.
pub const WORKBOOK_CONFIG_FILE: &str = "mapgen.toml";

#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Directory holding one `<sheet>.csv` per workbook sheet.
    pub workbook_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub capture_mode: DataCaptureMode,
    pub delimiter: u8,
    /// Use deterministic hub short-name suffixes.
    pub stable_names: bool,
}

impl BuildRequest {
    pub fn new(workbook_dir: impl Into<PathBuf>) -> Self {
        Self {
            workbook_dir: workbook_dir.into(),
            config_path: None,
            capture_mode: DataCaptureMode::Snapshot,
            delimiter: b',',
            stable_names: false,
        }
    }
}

/// Explicit config path, else `mapgen.toml` in the workbook directory, else
/// built-in defaults.
pub fn resolve_config(explicit: Option<&Path>, workbook_dir: &Path) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path).with_context(|| format!("load config {}", path.display()));
    }
    let beside = workbook_dir.join(WORKBOOK_CONFIG_FILE);
    if beside.is_file() {
        return load_config(&beside).with_context(|| format!("load config {}", beside.display()));
    }
    info!("no configuration file found, using defaults");
    Ok(Config::default())
}

pub fn run_build(request: &BuildRequest) -> Result<RunReport> {
    let dir = &request.workbook_dir;
    let span = info_span!("build", workbook = %dir.display(), mode = %request.capture_mode);
    let _guard = span.enter();

    let config = resolve_config(request.config_path.as_deref(), dir)?;
    let workbook = CsvWorkbook::from_dir(dir)
        .with_context(|| format!("read workbook {}", dir.display()))?
        .with_delimiter(request.delimiter);
    let options = RunOptions {
        capture_mode: request.capture_mode,
    };
    let mut names: Box<dyn NameGenerator> = if request.stable_names {
        Box::new(SequentialNameGenerator::new())
    } else {
        Box::new(RandomNameGenerator)
    };
    let report = run_from_reader(&workbook, &config, options, names.as_mut())
        .with_context(|| format!("build workbook {}", dir.display()))?;
    Ok(report)
}

/// One built table as written to the JSON output.
#[derive(Debug, Serialize)]
pub struct TableDocument<'a> {
    pub table: String,
    #[serde(flatten)]
    pub contexts: &'a TableMapping,
    pub workflow_file: String,
    pub control_flow_file: String,
    pub tags: BTreeMap<&'static str, String>,
}

impl<'a> TableDocument<'a> {
    pub fn new(contexts: &'a TableMapping) -> Self {
        Self {
            table: contexts.target.table.qualified(),
            contexts,
            workflow_file: contexts.mapping.workflow_file(),
            control_flow_file: contexts.mapping.control_flow_file(),
            tags: contexts.mapping.tag_values(),
        }
    }
}

pub fn documents(report: &RunReport) -> Vec<TableDocument<'_>> {
    report.built().map(TableDocument::new).collect()
}

/// Write every built table as a pretty-printed JSON array.
pub fn write_json(report: &RunReport, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &documents(report)).context("serialize contexts")?;
    writeln!(writer).context("write contexts")?;
    Ok(())
}
