use mapgen_config::SourceSystemProfile;
use mapgen_model::{
    DataCaptureMode, FieldDescriptor, HubFieldDescriptor, KeyIgnoreLists, SourceContext,
    TableIdent, TargetContext,
};

use crate::BuildContext;

/// Source context with the source system's technical columns appended.
///
/// Technical columns already mapped from the sheet are not repeated.
pub fn source_context(
    table: TableIdent,
    mut fields: Vec<FieldDescriptor>,
    profile: &SourceSystemProfile,
    source_system: &str,
    capture_mode: DataCaptureMode,
) -> SourceContext {
    for technical in profile
        .technical_fields
        .iter()
        .filter(|technical| technical.applies_to(capture_mode))
    {
        if fields.iter().any(|field| field.name == technical.name) {
            continue;
        }
        fields.push(FieldDescriptor::new(&technical.name, &technical.datatype));
    }
    SourceContext {
        table,
        fields,
        data_capture_mode: capture_mode,
        source_system: source_system.to_string(),
    }
}

/// Target context with hash and distribution keys derived from the
/// configured ignore lists.
pub fn target_context(
    ctx: &BuildContext<'_>,
    table: TableIdent,
    fields: Vec<FieldDescriptor>,
    hub_fields: Vec<HubFieldDescriptor>,
    source_code: &str,
) -> TargetContext {
    let keys = &ctx.config.keys;
    let ignore = KeyIgnoreLists {
        hash: &keys.hash_ignore,
        distribution: &keys.distribution_ignore,
    };
    TargetContext::new(table, fields, hub_fields, ignore, source_code)
}
