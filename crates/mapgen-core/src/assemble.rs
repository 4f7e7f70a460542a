//! Field-map assembly for the non-hub target fields of a table.

use mapgen_config::ExtraField;
use mapgen_model::{
    DataCaptureMode, Diagnostics, FieldMapEntry, FieldMapKind, HubFieldDescriptor, MappingError,
    RawMappingRow, Violations, WarningKind,
};

use crate::BuildContext;

pub struct MappingContextAssembler<'a> {
    ctx: BuildContext<'a>,
}

impl<'a> MappingContextAssembler<'a> {
    pub fn new(ctx: BuildContext<'a>) -> Self {
        Self { ctx }
    }

    /// Ordered field map: sheet-derived entries, then configured extra fields.
    ///
    /// Rows without a source field or expression and extra fields colliding
    /// with an existing target field are all collected into one
    /// `MappingDescription` error.
    pub fn field_map(
        &self,
        rows: &[&RawMappingRow],
        hubs: &[HubFieldDescriptor],
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<FieldMapEntry>, MappingError> {
        let mut violations = Violations::new(self.ctx.table);
        let mut entries: Vec<FieldMapEntry> = Vec::new();

        for row in rows.iter().filter(|row| !row.is_hub()) {
            let Some(entry) = self.row_entry(row, &mut violations, diagnostics) else {
                continue;
            };
            if entries
                .iter()
                .any(|existing| existing.target_field == entry.target_field)
            {
                violations.push(format!(
                    "{}: target field `{}` is mapped more than once",
                    row.label(),
                    entry.target_field
                ));
                continue;
            }
            entries.push(entry);
        }

        let mut injected: Vec<String> = Vec::new();
        for extra in self.injected_fields(&mut violations) {
            if injected.contains(&extra.name) {
                violations.push(format!(
                    "injected field `{}` is injected more than once ({} load)",
                    extra.name, self.ctx.capture_mode
                ));
                continue;
            }
            injected.push(extra.name.clone());
            let collides = entries
                .iter()
                .any(|entry| entry.target_field == extra.name)
                || hubs.iter().any(|hub| hub.source_field_name == extra.name);
            if collides {
                violations.push(format!(
                    "injected field `{}` collides with a field already mapped from the sheet",
                    extra.name
                ));
                continue;
            }
            entries.push(FieldMapEntry {
                target_field: extra.name,
                kind: extra.kind,
                value: extra.value,
                target_datatype: extra.datatype,
            });
        }

        violations.into_mapping_description()?;
        Ok(entries)
    }

    fn row_entry(
        &self,
        row: &RawMappingRow,
        violations: &mut Violations,
        diagnostics: &mut Diagnostics,
    ) -> Option<FieldMapEntry> {
        let datatypes = &self.ctx.config.datatypes;
        let target_datatype = datatypes.canonical(&row.target_datatype);

        if let Some(source_field) = row.source_field.as_deref() {
            let source_datatype = row
                .source_datatype
                .as_deref()
                .map(|datatype| datatypes.canonical(datatype));
            if source_datatype.as_deref() == Some("string") && target_datatype == "timestamp" {
                return Some(FieldMapEntry::sql_expression(
                    &row.target_field,
                    format!("{source_field}::timestamp"),
                    target_datatype,
                ));
            }
            return Some(FieldMapEntry::column(
                &row.target_field,
                source_field,
                target_datatype,
            ));
        }

        let expression = row
            .expression
            .as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty());
        let Some(expression) = expression else {
            violations.push(format!("{}: incorrect field description", row.label()));
            return None;
        };
        let value = match expression.strip_prefix('=') {
            Some(stripped) => stripped.trim_start(),
            None => {
                let message = format!(
                    "{}: expression `{expression}` does not start with `=`",
                    row.label()
                );
                tracing::warn!(table = %self.ctx.table, "{message}");
                diagnostics.warn(WarningKind::ExpressionFormat, self.ctx.table, message);
                expression
            }
        };
        Some(FieldMapEntry::sql_expression(
            &row.target_field,
            value,
            target_datatype,
        ))
    }

    /// Configured extra fields for the capture mode, plus the deleted flag
    /// of increment loads.
    fn injected_fields(&self, violations: &mut Violations) -> Vec<ExtraField> {
        let config = self.ctx.config;
        let mode = self.ctx.capture_mode;
        let mut fields: Vec<ExtraField> = config
            .extra_fields
            .iter()
            .filter(|extra| extra.applies_to(mode))
            .cloned()
            .collect();

        if mode == DataCaptureMode::Increment {
            match self.ctx.profile.and_then(|profile| profile.delete_marker.as_ref()) {
                Some(marker) => fields.push(ExtraField {
                    name: config.workflow.deleted_flag_field.clone(),
                    kind: FieldMapKind::SqlExpression,
                    value: marker.clone(),
                    datatype: "boolean".to_string(),
                    capture_mode: Some(DataCaptureMode::Increment),
                }),
                None => violations.push(
                    "increment load requires a delete marker for its source system".to_string(),
                ),
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapgen_config::{Config, SourceSystemProfile};

    fn row(number: usize, target: &str) -> RawMappingRow {
        RawMappingRow {
            row_number: number,
            target_table: "sales.orders".to_string(),
            target_field: target.to_string(),
            target_datatype: "text".to_string(),
            ..RawMappingRow::default()
        }
    }

    #[test]
    fn expression_without_prefix_is_used_raw_with_warning() {
        let config = Config::default();
        let mut computed = row(2, "channel");
        computed.expression = Some("'web'".to_string());
        let rows = [computed];
        let refs: Vec<&RawMappingRow> = rows.iter().collect();
        let mut diagnostics = Diagnostics::new();
        let entries = MappingContextAssembler::new(BuildContext::new(&config, "sales.orders"))
            .field_map(&refs, &[], &mut diagnostics)
            .unwrap();
        assert_eq!(entries[0].value, "'web'");
        assert_eq!(entries[0].kind, FieldMapKind::SqlExpression);
        assert_eq!(diagnostics.count(WarningKind::ExpressionFormat), 1);
    }

    #[test]
    fn snapshot_loads_get_no_deleted_flag() {
        let config = Config::default();
        let profile = SourceSystemProfile {
            delete_marker: Some("upper(changetype) = 'DELETE'".to_string()),
            ..SourceSystemProfile::default()
        };
        let mut mapped = row(2, "order_no");
        mapped.source_field = Some("order_no".to_string());
        let rows = [mapped];
        let refs: Vec<&RawMappingRow> = rows.iter().collect();
        let ctx = BuildContext::new(&config, "sales.orders").with_profile(&profile);
        let entries = MappingContextAssembler::new(ctx)
            .field_map(&refs, &[], &mut Diagnostics::new())
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, FieldMapKind::Column);
    }

    #[test]
    fn increment_without_delete_marker_fails() {
        let config = Config::default();
        let profile = SourceSystemProfile::default();
        let mut mapped = row(2, "order_no");
        mapped.source_field = Some("order_no".to_string());
        let rows = [mapped];
        let refs: Vec<&RawMappingRow> = rows.iter().collect();
        let ctx = BuildContext::new(&config, "sales.orders")
            .with_profile(&profile)
            .with_capture_mode(DataCaptureMode::Increment);
        let err = MappingContextAssembler::new(ctx)
            .field_map(&refs, &[], &mut Diagnostics::new())
            .unwrap_err();
        assert_eq!(err.kind(), "mapping-description");
    }

    #[test]
    fn configured_deleted_flag_clashes_with_synthesized_one() {
        let mut config = Config::default();
        config.extra_fields.push(ExtraField {
            name: "deleted_flg".to_string(),
            kind: FieldMapKind::SqlExpression,
            value: "false".to_string(),
            datatype: "boolean".to_string(),
            capture_mode: None,
        });
        let profile = SourceSystemProfile {
            delete_marker: Some("upper(changetype) = 'DELETE'".to_string()),
            ..SourceSystemProfile::default()
        };
        let mut mapped = row(2, "order_no");
        mapped.source_field = Some("order_no".to_string());
        let rows = [mapped];
        let refs: Vec<&RawMappingRow> = rows.iter().collect();
        let ctx = BuildContext::new(&config, "sales.orders")
            .with_profile(&profile)
            .with_capture_mode(DataCaptureMode::Increment);
        let err = MappingContextAssembler::new(ctx)
            .field_map(&refs, &[], &mut Diagnostics::new())
            .unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["injected field `deleted_flg` is injected more than once (increment load)"]
        );
    }
}
