use thiserror::Error;

/// Errors raised while constructing model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("table name is empty")]
    EmptyTableName,
    #[error("table name `{0}` has no schema component")]
    MissingSchema(String),
    #[error("table name `{0}` must contain exactly one schema separator")]
    InvalidQualifiedName(String),
    #[error("unknown data capture mode `{0}` (expected snapshot or increment)")]
    InvalidCaptureMode(String),
    #[error("unknown field map kind `{0}` (expected column or sql_expression)")]
    InvalidFieldMapKind(String),
}

/// Failures of the mapping model builder.
///
/// `SchemaValidation` and `DuplicateTable` abort the whole run. The remaining
/// variants are scoped to a single target table; the run driver records them
/// and moves on to the next table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("sheet `{sheet}` is missing required columns: {}", .missing.join(", "))]
    SchemaValidation { sheet: String, missing: Vec<String> },

    #[error("target tables listed more than once: {}", .tables.join(", "))]
    DuplicateTable { tables: Vec<String> },

    #[error("field validation failed for `{table}`: {}", .violations.join("; "))]
    FieldValidation {
        table: String,
        violations: Vec<String>,
    },

    #[error("structural data error in `{table}`: {message}")]
    StructuralData { table: String, message: String },

    #[error("incorrect mapping description for `{table}`: {}", .messages.join("; "))]
    MappingDescription { table: String, messages: Vec<String> },
}

impl MappingError {
    pub fn structural(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StructuralData {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn description(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MappingDescription {
            table: table.into(),
            messages: vec![message.into()],
        }
    }

    /// Whether the error stops the whole run rather than a single table.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Self::SchemaValidation { .. } | Self::DuplicateTable { .. }
        )
    }

    /// Short category label used in summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SchemaValidation { .. } => "schema",
            Self::DuplicateTable { .. } => "duplicate-table",
            Self::FieldValidation { .. } => "field-validation",
            Self::StructuralData { .. } => "structural-data",
            Self::MappingDescription { .. } => "mapping-description",
        }
    }

    /// Every individual message carried by the error.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::SchemaValidation { missing, .. } => missing
                .iter()
                .map(|column| format!("missing column `{column}`"))
                .collect(),
            Self::DuplicateTable { tables } => tables
                .iter()
                .map(|table| format!("duplicate target table `{table}`"))
                .collect(),
            Self::FieldValidation { violations, .. } => violations.clone(),
            Self::StructuralData { message, .. } => vec![message.clone()],
            Self::MappingDescription { messages, .. } => messages.clone(),
        }
    }
}
