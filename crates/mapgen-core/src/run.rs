//! Run driver: builds every catalog table in order with table-level isolation.

use mapgen_config::Config;
use mapgen_ingest::{IngestError, MappingWorkbook, SheetReader};
use mapgen_model::{DataCaptureMode, Diagnostics, MappingError, TableMapping};
use tracing::info_span;

use crate::{NameGenerator, build_table};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub capture_mode: DataCaptureMode,
}

#[derive(Debug, Clone)]
pub enum TableOutcome {
    Built(Box<TableMapping>),
    /// Flow excluded by the workflow filters.
    Skipped { reason: String },
    Failed(MappingError),
}

#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: String,
    pub outcome: TableOutcome,
}

impl TableReport {
    pub fn mapping(&self) -> Option<&TableMapping> {
        match &self.outcome {
            TableOutcome::Built(mapping) => Some(mapping.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&MappingError> {
        match &self.outcome {
            TableOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome of every table plus the warnings raised along the way.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub tables: Vec<TableReport>,
    pub diagnostics: Diagnostics,
}

impl RunReport {
    pub fn built(&self) -> impl Iterator<Item = &TableMapping> {
        self.tables.iter().filter_map(TableReport::mapping)
    }

    pub fn failed(&self) -> impl Iterator<Item = &TableReport> {
        self.tables
            .iter()
            .filter(|report| matches!(report.outcome, TableOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &TableReport> {
        self.tables
            .iter()
            .filter(|report| matches!(report.outcome, TableOutcome::Skipped { .. }))
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|report| report.table == name)
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.has_warnings()
    }
}

/// Build every table of the workbook in catalog order.
///
/// A table failure is recorded in the report and the run moves on.
pub fn run(
    workbook: &MappingWorkbook,
    config: &Config,
    options: RunOptions,
    names: &mut dyn NameGenerator,
) -> RunReport {
    let mut report = RunReport::default();
    let uncataloged = workbook.uncataloged_tables();
    if !uncataloged.is_empty() {
        tracing::warn!(
            tables = %uncataloged.join(", "),
            "mapping rows reference target tables missing from the catalog; they are not built"
        );
    }
    for entry in &workbook.catalog {
        let span = info_span!("table", table = %entry.target_table);
        let _guard = span.enter();

        let outcome = match entry.flow_name.as_deref() {
            Some(flow) if !config.workflow.accepts(flow) => {
                tracing::info!(flow, "flow excluded by workflow filters");
                TableOutcome::Skipped {
                    reason: format!("flow `{flow}` matches no workflow filter"),
                }
            }
            _ => {
                let rows = workbook.rows_for(&entry.target_table);
                match build_table(
                    entry,
                    &rows,
                    config,
                    options.capture_mode,
                    names,
                    &mut report.diagnostics,
                ) {
                    Ok(mapping) => TableOutcome::Built(Box::new(mapping)),
                    Err(err) => {
                        tracing::error!(kind = err.kind(), "{err}");
                        TableOutcome::Failed(err)
                    }
                }
            }
        };
        report.tables.push(TableReport {
            table: entry.target_table.clone(),
            outcome,
        });
    }
    tracing::info!(
        tables = report.tables.len(),
        built = report.built().count(),
        failed = report.failed().count(),
        skipped = report.skipped().count(),
        warnings = report.diagnostics.warnings().len(),
        "run complete"
    );
    report
}

/// Load the workbook through `reader` and run it.
///
/// Schema and duplicate-table errors abort before any table is built.
pub fn run_from_reader(
    reader: &dyn SheetReader,
    config: &Config,
    options: RunOptions,
    names: &mut dyn NameGenerator,
) -> Result<RunReport, IngestError> {
    let workbook = MappingWorkbook::load(reader, &config.sheets)?;
    Ok(run(&workbook, config, options, names))
}
