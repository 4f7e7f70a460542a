//! Column and value normalization.

use std::collections::BTreeSet;

use mapgen_model::MappingError;

use crate::workbook::{RawSheet, SheetRow};

/// A sheet with normalized headers and without empty rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

/// Lower-case, trim and collapse inner whitespace of a header.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

impl Sheet {
    pub fn normalize(raw: RawSheet) -> Self {
        let headers = raw.headers.iter().map(|h| normalize_header(h)).collect();
        let rows = raw
            .rows
            .into_iter()
            .map(|row| SheetRow {
                number: row.number,
                cells: row.cells.iter().map(|c| normalize_cell(c)).collect(),
            })
            .filter(|row| row.cells.iter().any(|cell| !cell.is_empty()))
            .collect();
        Self {
            name: raw.name,
            headers,
            rows,
        }
    }

    /// Fail with every required column that is absent, not just the first.
    pub fn require_columns(&self, required: &[&str]) -> Result<(), MappingError> {
        let mut seen = BTreeSet::new();
        let missing: Vec<String> = required
            .iter()
            .map(|column| normalize_header(column))
            .filter(|column| seen.insert(column.clone()))
            .filter(|column| self.column_index(column).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MappingError::SchemaValidation {
                sheet: self.name.clone(),
                missing,
            })
        }
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        let wanted = normalize_header(header);
        self.headers.iter().position(|h| *h == wanted)
    }

    /// Trimmed cell value; `None` when the column is absent or the cell empty.
    pub fn cell<'a>(&self, row: &'a SheetRow, header: &str) -> Option<&'a str> {
        let idx = self.column_index(header)?;
        row.cells
            .get(idx)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Lower-cased cell value, for key columns.
    pub fn key(&self, row: &SheetRow, header: &str) -> Option<String> {
        self.cell(row, header).map(str::to_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawSheet {
        RawSheet {
            name: "mapping".to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(idx, cells)| SheetRow {
                    number: idx + 2,
                    cells: cells.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn headers_are_normalized() {
        assert_eq!(normalize_header("\u{feff} Tgt   Table "), "tgt table");
        assert_eq!(normalize_header("Attr:BK_Object"), "attr:bk_object");
    }

    #[test]
    fn empty_rows_are_dropped() {
        let sheet = Sheet::normalize(raw(
            &["A", "B"],
            &[&["x", ""], &["  ", ""], &["", "y"]],
        ));
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1].number, 4);
    }

    #[test]
    fn every_missing_column_is_listed() {
        let sheet = Sheet::normalize(raw(&["Tgt_Table"], &[]));
        let err = sheet
            .require_columns(&["tgt_table", "TGT_ATTRIBUTE", "expression", "expression"])
            .unwrap_err();
        assert_eq!(
            err,
            MappingError::SchemaValidation {
                sheet: "mapping".to_string(),
                missing: vec!["tgt_attribute".to_string(), "expression".to_string()],
            }
        );
    }

    #[test]
    fn key_cells_are_lower_cased() {
        let sheet = Sheet::normalize(raw(&["Name", "Expr"], &[&[" Sales.Orders ", " ='DAPP' "]]));
        let row = &sheet.rows[0];
        assert_eq!(sheet.key(row, "name").as_deref(), Some("sales.orders"));
        assert_eq!(sheet.cell(row, "expr"), Some("='DAPP'"));
        assert_eq!(sheet.cell(row, "missing"), None);
    }
}
