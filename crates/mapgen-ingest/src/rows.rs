//! Typed rows of the catalog and mapping sheets.

use std::collections::{BTreeMap, BTreeSet};

use mapgen_config::{CatalogSheet, MappingSheet, SheetsConfig};
use mapgen_model::{CatalogRow, MappingError, RawMappingRow};

use crate::IngestError;
use crate::sheet::Sheet;
use crate::workbook::SheetReader;

/// Split a pk-flag cell such as `pk, bk` into lower-case tokens.
pub fn split_pk_flags(raw: &str) -> Vec<String> {
    raw.split(|ch: char| ch == ',' || ch == ';' || ch == '/' || ch.is_whitespace())
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Read the table catalog, rejecting target tables listed more than once.
pub fn read_catalog(
    reader: &dyn SheetReader,
    layout: &CatalogSheet,
) -> Result<Vec<CatalogRow>, IngestError> {
    let sheet = Sheet::normalize(reader.read_sheet(&layout.name, layout.header_row)?);
    let mut required = layout.essential_columns();
    required.extend(layout.required_columns.iter().map(String::as_str));
    sheet.require_columns(&required)?;

    let mut rows = Vec::new();
    for row in &sheet.rows {
        let Some(target_table) = sheet.key(row, &layout.target_table) else {
            tracing::debug!(row = row.number, "catalog row without target table skipped");
            continue;
        };
        rows.push(CatalogRow {
            row_number: row.number,
            target_table,
            source_table: sheet.key(row, &layout.source_table),
            flow_name: sheet.key(row, &layout.flow_name),
            source_system: sheet.cell(row, &layout.source_system).map(str::to_uppercase),
            algorithm_id: sheet.cell(row, &layout.algorithm_id).map(str::to_string),
        });
    }
    reject_duplicate_tables(&rows)?;
    tracing::info!(sheet = %layout.name, tables = rows.len(), "read table catalog");
    Ok(rows)
}

fn reject_duplicate_tables(rows: &[CatalogRow]) -> Result<(), MappingError> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.target_table.as_str()).or_insert(0) += 1;
    }
    let mut duplicates: Vec<String> = Vec::new();
    for row in rows {
        let name = row.target_table.as_str();
        if counts.get(name).copied().unwrap_or(0) > 1 && !duplicates.iter().any(|d| d == name) {
            duplicates.push(name.to_string());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(MappingError::DuplicateTable { tables: duplicates })
    }
}

/// Read the field-mapping rows, dropping superseded mapping versions.
pub fn read_mapping_rows(
    reader: &dyn SheetReader,
    layout: &MappingSheet,
) -> Result<Vec<RawMappingRow>, IngestError> {
    let sheet = Sheet::normalize(reader.read_sheet(&layout.name, layout.header_row)?);
    let mut required = layout.essential_columns();
    required.extend(layout.required_columns.iter().map(String::as_str));
    sheet.require_columns(&required)?;

    let mut rows = Vec::new();
    let mut superseded = 0usize;
    for row in &sheet.rows {
        if sheet.cell(row, &layout.mapping_version_to).is_some() {
            superseded += 1;
            continue;
        }
        let Some(target_table) = sheet.key(row, &layout.target_table) else {
            tracing::debug!(row = row.number, "mapping row without target table skipped");
            continue;
        };
        rows.push(RawMappingRow {
            row_number: row.number,
            target_table,
            target_field: sheet.key(row, &layout.target_field).unwrap_or_default(),
            target_datatype: sheet.key(row, &layout.target_datatype).unwrap_or_default(),
            mandatory_flag: sheet
                .key(row, &layout.mandatory_flag)
                .map(|flag| flag.split_whitespace().collect::<Vec<_>>().join(" ")),
            pk_flags: sheet
                .cell(row, &layout.pk_flags)
                .map(split_pk_flags)
                .unwrap_or_default(),
            source_table: sheet.key(row, &layout.source_table),
            source_field: sheet.key(row, &layout.source_field),
            source_datatype: sheet.key(row, &layout.source_datatype),
            expression: sheet.cell(row, &layout.expression).map(str::to_string),
            conversion_type: sheet.key(row, &layout.conversion_type),
            bk_schema: sheet.key(row, &layout.bk_schema),
            bk_object: sheet.key(row, &layout.bk_object),
            null_default: sheet.cell(row, &layout.null_default).map(str::to_string),
            algorithm_id: sheet.cell(row, &layout.algorithm_id).map(str::to_string),
            subalgorithm_id: sheet.cell(row, &layout.subalgorithm_id).map(str::to_string),
        });
    }
    tracing::info!(
        sheet = %layout.name,
        rows = rows.len(),
        superseded,
        "read mapping rows"
    );
    Ok(rows)
}

/// Both sheets of a mapping workbook, parsed and schema-checked.
#[derive(Debug, Clone, Default)]
pub struct MappingWorkbook {
    pub catalog: Vec<CatalogRow>,
    pub rows: Vec<RawMappingRow>,
}

impl MappingWorkbook {
    pub fn load(reader: &dyn SheetReader, sheets: &SheetsConfig) -> Result<Self, IngestError> {
        let catalog = read_catalog(reader, &sheets.catalog)?;
        let rows = read_mapping_rows(reader, &sheets.mapping)?;
        Ok(Self { catalog, rows })
    }

    /// Target tables in catalog order.
    pub fn target_tables(&self) -> Vec<&str> {
        self.catalog
            .iter()
            .map(|row| row.target_table.as_str())
            .collect()
    }

    pub fn catalog_entry(&self, target_table: &str) -> Option<&CatalogRow> {
        self.catalog
            .iter()
            .find(|row| row.target_table == target_table)
    }

    /// Target tables of mapping rows that have no catalog entry, sorted.
    pub fn uncataloged_tables(&self) -> Vec<&str> {
        let listed: BTreeSet<&str> = self.target_tables().into_iter().collect();
        self.rows
            .iter()
            .map(|row| row.target_table.as_str())
            .filter(|table| !listed.contains(table))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Mapping rows of one target table, in sheet order.
    pub fn rows_for(&self, target_table: &str) -> Vec<&RawMappingRow> {
        self.rows
            .iter()
            .filter(|row| row.target_table == target_table)
            .collect()
    }
}
