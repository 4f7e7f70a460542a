//! Field-level model types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// How the source table is captured by the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCaptureMode {
    /// Full reload of the source on every run.
    #[default]
    Snapshot,
    /// Delta load carrying insert/update/delete markers.
    Increment,
}

impl DataCaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Increment => "increment",
        }
    }
}

impl FromStr for DataCaptureMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "increment" => Ok(Self::Increment),
            _ => Err(ModelError::InvalidCaptureMode(s.to_string())),
        }
    }
}

impl fmt::Display for DataCaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column of a source or target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub datatype: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub comment: Option<String>,
}

impl FieldDescriptor {
    /// A nullable, non-key field.
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            is_nullable: true,
            is_primary_key: false,
            comment: None,
        }
    }

    /// Marks the field as part of the primary key, which also makes it not null.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }
}

/// How a target field receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMapKind {
    /// Direct copy of a source column.
    Column,
    /// Computed SQL expression.
    SqlExpression,
}

impl FieldMapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::SqlExpression => "sql_expression",
        }
    }
}

impl FromStr for FieldMapKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "column" => Ok(Self::Column),
            "sql_expression" | "expression" => Ok(Self::SqlExpression),
            _ => Err(ModelError::InvalidFieldMapKind(s.to_string())),
        }
    }
}

impl fmt::Display for FieldMapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One target field of the field map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapEntry {
    pub target_field: String,
    pub kind: FieldMapKind,
    pub value: String,
    pub target_datatype: String,
}

impl FieldMapEntry {
    pub fn column(
        target_field: impl Into<String>,
        source_field: impl Into<String>,
        target_datatype: impl Into<String>,
    ) -> Self {
        Self {
            target_field: target_field.into(),
            kind: FieldMapKind::Column,
            value: source_field.into(),
            target_datatype: target_datatype.into(),
        }
    }

    pub fn sql_expression(
        target_field: impl Into<String>,
        expression: impl Into<String>,
        target_datatype: impl Into<String>,
    ) -> Self {
        Self {
            target_field: target_field.into(),
            kind: FieldMapKind::SqlExpression,
            value: expression.into(),
            target_datatype: target_datatype.into(),
        }
    }
}
