use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use tracing::info;

use mapgen_cli::build::{BuildRequest, run_build, write_json};
use mapgen_config::load_config;
use mapgen_core::RunReport;

use crate::cli::{BuildArgs, SourcesArgs};
use crate::summary::apply_table_style;

pub fn run_build_command(args: &BuildArgs) -> Result<RunReport> {
    if !args.delimiter.is_ascii() {
        bail!("delimiter `{}` is not a single-byte character", args.delimiter);
    }
    let request = BuildRequest {
        workbook_dir: args.workbook_dir.clone(),
        config_path: args.config.clone(),
        capture_mode: args.load_mode.into(),
        delimiter: args.delimiter as u8,
        stable_names: args.stable_names,
    };
    let report = run_build(&request)?;
    if let Some(path) = &args.json {
        write_contexts(&report, path)?;
    }
    Ok(report)
}

fn write_contexts(report: &RunReport, path: &Path) -> Result<()> {
    if path.as_os_str() == "-" {
        return write_json(report, io::stdout().lock());
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_json(report, BufWriter::new(file))?;
    info!(path = %path.display(), "wrote contexts");
    Ok(())
}

pub fn run_sources(args: &SourcesArgs) -> Result<()> {
    let config = load_config(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;
    let mut table = Table::new();
    table.set_header(vec![
        "Source system",
        "Delete marker",
        "Technical fields",
        "Required fields",
    ]);
    apply_table_style(&mut table);
    for (code, profile) in &config.source_systems {
        let technical = profile
            .technical_fields
            .iter()
            .map(|field| match field.capture_mode {
                Some(mode) => format!("{} ({}, {mode} only)", field.name, field.datatype),
                None => format!("{} ({})", field.name, field.datatype),
            })
            .collect::<Vec<_>>()
            .join("\n");
        let required = profile
            .required_fields
            .iter()
            .map(|field| format!("{} ({})", field.name, field.datatype))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            code.clone(),
            profile.delete_marker.clone().unwrap_or_else(|| "-".to_string()),
            if technical.is_empty() { "-".to_string() } else { technical },
            if required.is_empty() { "-".to_string() } else { required },
        ]);
    }
    println!("{table}");
    Ok(())
}
