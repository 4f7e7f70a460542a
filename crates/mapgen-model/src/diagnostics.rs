//! Violation and warning accumulators.
//!
//! Validation steps push every problem they find into a [`Violations`] value
//! instead of returning on the first one; the caller turns the accumulated
//! list into a single [`MappingError`]. Non-fatal findings go into the
//! run-wide [`Diagnostics`].

use serde::Serialize;

use crate::MappingError;

/// Rule violations collected for one target table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations {
    table: String,
    messages: Vec<String>,
}

impl Violations {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// `Ok(())` when nothing was collected, otherwise one `FieldValidation` error.
    pub fn into_field_validation(self) -> Result<(), MappingError> {
        if self.messages.is_empty() {
            return Ok(());
        }
        Err(MappingError::FieldValidation {
            table: self.table,
            violations: self.messages,
        })
    }

    /// `Ok(())` when nothing was collected, otherwise one `MappingDescription` error.
    pub fn into_mapping_description(self) -> Result<(), MappingError> {
        if self.messages.is_empty() {
            return Ok(());
        }
        Err(MappingError::MappingDescription {
            table: self.table,
            messages: self.messages,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Source/target datatype pair missing from the compatibility table.
    TypeCompatibility,
    /// Expression cell not starting with `=`.
    ExpressionFormat,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeCompatibility => "type-compatibility",
            Self::ExpressionFormat => "expression-format",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub table: String,
    pub message: String,
}

/// Non-fatal findings accumulated across every table of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, kind: WarningKind, table: &str, message: impl Into<String>) {
        self.warnings.push(Warning {
            kind,
            table: table.to_string(),
            message: message.into(),
        });
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    pub fn for_table<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Warning> + 'a {
        self.warnings.iter().filter(move |w| w.table == table)
    }
}
