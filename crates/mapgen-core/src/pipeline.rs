//! Per-table build pipeline.

use std::sync::LazyLock;

use regex::Regex;

use mapgen_config::{Config, Pattern};
use mapgen_model::{
    CatalogRow, DataCaptureMode, Diagnostics, MappingContext, MappingError, RawMappingRow,
    TableIdent, TableMapping, Violations,
};

use crate::{
    BuildContext, FieldCatalogBuilder, HubResolver, MappingContextAssembler, NameGenerator,
    source_context, target_context,
};

/// Source code token inside the source-code field's expression, e.g. `'DAPP'`.
static SOURCE_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][A-Z0-9_]*").expect("Invalid source code regex"));

/// Build the source, target and mapping contexts of one catalog entry.
pub fn build_table(
    entry: &CatalogRow,
    rows: &[&RawMappingRow],
    config: &Config,
    capture_mode: DataCaptureMode,
    names: &mut dyn NameGenerator,
    diagnostics: &mut Diagnostics,
) -> Result<TableMapping, MappingError> {
    let table = entry.target_table.as_str();
    let target = parse_table(table, table, &config.naming.target_table, "target")?;

    let mut problems = Violations::new(table);
    let source_name = entry
        .source_table
        .as_deref()
        .or_else(|| rows.iter().find_map(|row| row.source_table.as_deref()));
    let source = match source_name {
        Some(name) => Some(parse_table(table, name, &config.naming.source_table, "source")?),
        None => {
            problems.push("no source table in the catalog or the mapping rows");
            None
        }
    };
    if rows.is_empty() {
        problems.push("no mapping rows for the target table");
    }

    let workflow_name = workflow_name(entry.flow_name.as_deref());
    if workflow_name.is_none() {
        problems.push("flow name is empty");
    }
    let source_system = entry.source_system.clone().unwrap_or_default();
    let profile = config.source_system(&source_system);
    if profile.is_none() {
        problems.push(format!(
            "source system `{source_system}` has no configured profile"
        ));
    }
    let algorithm_id = entry
        .algorithm_id
        .clone()
        .or_else(|| rows.iter().find_map(|row| row.algorithm_id.clone()));
    if algorithm_id.is_none() {
        problems.push("algorithm id is empty");
    }
    let subalgorithm_id = rows.iter().find_map(|row| row.subalgorithm_id.clone());
    let source_code = source_code(rows, &config.workflow.source_code_field);
    if source_code.is_none() {
        problems.push(format!(
            "no source code in the expression of `{}`",
            config.workflow.source_code_field
        ));
    }
    problems.into_mapping_description()?;

    let (Some(source), Some(workflow_name), Some(profile), Some(algorithm_id), Some(source_code)) =
        (source, workflow_name, profile, algorithm_id, source_code)
    else {
        return Err(MappingError::description(table, "incomplete table metadata"));
    };

    let ctx = BuildContext::new(config, table)
        .with_capture_mode(capture_mode)
        .with_profile(profile);

    let catalog = FieldCatalogBuilder::new(ctx).build(rows, diagnostics)?;
    let hub_fields = HubResolver::new(ctx, names).resolve(rows)?;
    let field_map = MappingContextAssembler::new(ctx).field_map(rows, &hub_fields, diagnostics)?;

    let source_context = source_context(
        source.clone(),
        catalog.source_fields,
        profile,
        &source_system,
        capture_mode,
    );
    let target_context = target_context(
        &ctx,
        target.clone(),
        catalog.target_fields,
        hub_fields.clone(),
        &source_code,
    );
    let mapping = MappingContext {
        source,
        target,
        source_code,
        source_system,
        algorithm_id,
        subalgorithm_id,
        data_capture_mode: capture_mode,
        workflow_name,
        field_map,
        hub_fields,
    };
    tracing::info!(
        fields = mapping.field_map.len(),
        hubs = mapping.hub_fields.len(),
        hash_fields = target_context.hash_fields.len(),
        "table contexts assembled"
    );
    Ok(TableMapping {
        source: source_context,
        target: target_context,
        mapping,
    })
}

fn parse_table(
    table: &str,
    name: &str,
    pattern: &Pattern,
    role: &str,
) -> Result<TableIdent, MappingError> {
    if !pattern.is_match(name) {
        return Err(MappingError::structural(
            table,
            format!("{role} table `{name}` does not match `{pattern}`"),
        ));
    }
    TableIdent::parse(name).map_err(|err| MappingError::structural(table, err.to_string()))
}

/// Flow name without its `wf_` prefix; `None` when nothing is left.
pub(crate) fn workflow_name(flow_name: Option<&str>) -> Option<String> {
    let flow = flow_name?.trim();
    let name = flow.strip_prefix("wf_").unwrap_or(flow);
    (!name.is_empty()).then(|| name.to_string())
}

/// First upper-case token of the source-code field's expression.
fn source_code(rows: &[&RawMappingRow], field: &str) -> Option<String> {
    let expression = rows
        .iter()
        .find(|row| row.target_field == field)?
        .expression
        .as_deref()?;
    SOURCE_CODE_REGEX
        .find(expression)
        .map(|found| found.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_prefix_is_removed() {
        assert_eq!(
            workflow_name(Some("wf_dapp_orders")),
            Some("dapp_orders".to_string())
        );
        assert_eq!(workflow_name(Some("dapp_orders")), Some("dapp_orders".to_string()));
        assert_eq!(workflow_name(Some("wf_")), None);
        assert_eq!(workflow_name(None), None);
    }

    #[test]
    fn source_code_is_first_upper_case_token() {
        let row = RawMappingRow {
            target_field: "src_cd".to_string(),
            expression: Some("='DAPP'".to_string()),
            ..RawMappingRow::default()
        };
        assert_eq!(source_code(&[&row], "src_cd"), Some("DAPP".to_string()));

        let lower = RawMappingRow {
            expression: Some("='dapp'".to_string()),
            ..row
        };
        assert_eq!(source_code(&[&lower], "src_cd"), None);
    }
}
