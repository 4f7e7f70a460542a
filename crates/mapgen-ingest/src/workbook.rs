//! Sheet reading.
//!
//! The builder only needs named columns of string cells, so the reader is a
//! small trait. [`CsvWorkbook`] implements it over one CSV document per
//! logical sheet, held fully in memory before parsing starts.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;

use crate::IngestError;

/// A data row of a sheet with its 1-based position in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub number: usize,
    pub cells: Vec<String>,
}

/// Header and data rows of one sheet, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

/// Source of named sheets.
pub trait SheetReader {
    /// Read `sheet`, taking line `header_row` (zero-based) as the header and
    /// discarding the lines above it. Row numbers are 1-based sheet lines.
    fn read_sheet(&self, sheet: &str, header_row: usize) -> Result<RawSheet, IngestError>;
}

/// Workbook whose sheets are CSV documents.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    sheets: BTreeMap<String, Vec<u8>>,
    delimiter: u8,
}

impl Default for CsvWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvWorkbook {
    pub fn new() -> Self {
        Self {
            sheets: BTreeMap::new(),
            delimiter: b',',
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_sheet(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.sheets.insert(sheet_key(name), bytes.into());
    }

    /// Load every `*.csv` file of `dir`, keyed by file stem.
    pub fn from_dir(dir: &Path) -> Result<Self, IngestError> {
        let mut workbook = Self::new();
        let entries = fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| IngestError::io(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = fs::read(&path).map_err(|e| IngestError::io(&path, e))?;
            tracing::debug!(sheet = %stem, bytes = bytes.len(), "loaded sheet");
            workbook.insert(stem, bytes);
        }
        Ok(workbook)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }
}

impl SheetReader for CsvWorkbook {
    fn read_sheet(&self, sheet: &str, header_row: usize) -> Result<RawSheet, IngestError> {
        let bytes = self
            .sheets
            .get(&sheet_key(sheet))
            .ok_or_else(|| IngestError::MissingSheet(sheet.to_string()))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(bytes.as_slice());

        let mut headers = Vec::new();
        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|source| IngestError::Csv {
                sheet: sheet.to_string(),
                source,
            })?;
            // Blank lines yield no record, so number rows by source line.
            let number = record
                .position()
                .map_or(idx + 1, |position| position.line() as usize);
            if number <= header_row {
                continue;
            }
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            if number == header_row + 1 {
                headers = cells;
            } else {
                rows.push(SheetRow { number, cells });
            }
        }
        Ok(RawSheet {
            name: sheet.to_string(),
            headers,
            rows,
        })
    }
}

fn sheet_key(name: &str) -> String {
    name.trim().to_lowercase()
}
