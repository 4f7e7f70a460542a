//! Typed spreadsheet rows.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Key role tag on a target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PkFlag {
    /// Primary key: table identity.
    Pk,
    /// Business key: natural-key hashing.
    Bk,
    /// Reference key: hub foreign-key derivation.
    Rk,
}

impl PkFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pk => "pk",
            Self::Bk => "bk",
            Self::Rk => "rk",
        }
    }
}

impl FromStr for PkFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pk" => Ok(Self::Pk),
            "bk" => Ok(Self::Bk),
            "rk" => Ok(Self::Rk),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for PkFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mandatory flag value meaning the field accepts nulls.
pub const MANDATORY_NULL: &str = "null";
/// Mandatory flag value meaning the field rejects nulls.
pub const MANDATORY_NOT_NULL: &str = "not null";
/// Conversion type marking a hub reference row.
pub const CONVERSION_HUB: &str = "hub";

/// One row of the field-mapping sheet.
///
/// Key columns are lower-cased and trimmed at ingestion; free-text columns
/// (expression, null default, algorithm ids) are only trimmed. Empty cells
/// are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawMappingRow {
    /// 1-based row number in the sheet, header included.
    pub row_number: usize,
    pub target_table: String,
    pub target_field: String,
    pub target_datatype: String,
    pub mandatory_flag: Option<String>,
    /// Raw tokens of the pk column; validated by the field catalog builder.
    pub pk_flags: Vec<String>,
    pub source_table: Option<String>,
    pub source_field: Option<String>,
    pub source_datatype: Option<String>,
    pub expression: Option<String>,
    pub conversion_type: Option<String>,
    pub bk_schema: Option<String>,
    pub bk_object: Option<String>,
    pub null_default: Option<String>,
    pub algorithm_id: Option<String>,
    pub subalgorithm_id: Option<String>,
}

impl RawMappingRow {
    pub fn is_hub(&self) -> bool {
        self.conversion_type.as_deref() == Some(CONVERSION_HUB)
    }

    /// Mandatory flag with an empty cell read as `null`.
    pub fn mandatory(&self) -> &str {
        self.mandatory_flag.as_deref().unwrap_or(MANDATORY_NULL)
    }

    pub fn is_not_null(&self) -> bool {
        self.mandatory() == MANDATORY_NOT_NULL
    }

    pub fn has_flag(&self, flag: PkFlag) -> bool {
        self.pk_flags.iter().any(|token| token == flag.as_str())
    }

    /// Short label for messages, e.g. `row 14 (order_id)`.
    pub fn label(&self) -> String {
        if self.target_field.is_empty() {
            format!("row {}", self.row_number)
        } else {
            format!("row {} ({})", self.row_number, self.target_field)
        }
    }
}

/// One row of the table catalog sheet: a single load into a target table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub row_number: usize,
    pub target_table: String,
    pub source_table: Option<String>,
    pub flow_name: Option<String>,
    pub source_system: Option<String>,
    pub algorithm_id: Option<String>,
}
