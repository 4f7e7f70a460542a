//! Recognized configuration options.
//!
//! Every section is optional. Collections default to empty and patterns
//! default to the conventions of the downstream platform.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use mapgen_model::{DataCaptureMode, FieldMapKind};

use crate::pattern::{Pattern, builtin};

pub const DEFAULT_FIELD_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]*$";
pub const DEFAULT_TABLE_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]*\.[a-z][a-z0-9_]*$";
pub const DEFAULT_HUB_TABLE_PATTERN: &str = r"^[a-z][a-z0-9_]*\.[a-z][a-z0-9_]*$";
pub const DEFAULT_SOURCE_CODE_FIELD: &str = "src_cd";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sheets: SheetsConfig,
    pub datatypes: DatatypeConfig,
    pub naming: NamingConfig,
    pub predefined: PredefinedFields,
    pub keys: KeyConfig,
    pub extra_fields: Vec<ExtraField>,
    pub type_compatibility: TypeCompatibility,
    /// Keyed by upper-case source system code, e.g. `DAPP`.
    pub source_systems: BTreeMap<String, SourceSystemProfile>,
    pub workflow: WorkflowConfig,
}

impl Config {
    /// Profile for a source system code, matched case-insensitively.
    pub fn source_system(&self, code: &str) -> Option<&SourceSystemProfile> {
        self.source_systems
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(code))
            .map(|(_, profile)| profile)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub catalog: CatalogSheet,
    pub mapping: MappingSheet,
}

/// Sheet listing one row per target table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSheet {
    pub name: String,
    /// Zero-based line of the header; lines above it are titles.
    pub header_row: usize,
    /// Extra headers that must be present besides the ones read below.
    pub required_columns: Vec<String>,
    pub target_table: String,
    pub source_table: String,
    pub flow_name: String,
    pub source_system: String,
    pub algorithm_id: String,
}

impl Default for CatalogSheet {
    fn default() -> Self {
        Self {
            name: "catalog".to_string(),
            header_row: 0,
            required_columns: Vec::new(),
            target_table: "tgt_table".to_string(),
            source_table: "src_table".to_string(),
            flow_name: "flow_name".to_string(),
            source_system: "source_name".to_string(),
            algorithm_id: "algorithm_uid".to_string(),
        }
    }
}

impl CatalogSheet {
    pub fn essential_columns(&self) -> Vec<&str> {
        vec![
            self.target_table.as_str(),
            self.source_table.as_str(),
            self.flow_name.as_str(),
            self.source_system.as_str(),
            self.algorithm_id.as_str(),
        ]
    }
}

/// Sheet with the detailed field-mapping rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MappingSheet {
    pub name: String,
    pub header_row: usize,
    pub required_columns: Vec<String>,
    pub target_table: String,
    pub target_field: String,
    pub target_datatype: String,
    pub mandatory_flag: String,
    pub pk_flags: String,
    pub source_table: String,
    pub source_field: String,
    pub source_datatype: String,
    pub expression: String,
    pub conversion_type: String,
    pub bk_schema: String,
    pub bk_object: String,
    pub null_default: String,
    pub algorithm_id: String,
    /// Optional; read as empty when the sheet has no such column.
    pub subalgorithm_id: String,
    /// Optional; rows with a value here are superseded versions.
    pub mapping_version_to: String,
}

impl Default for MappingSheet {
    fn default() -> Self {
        Self {
            name: "mapping".to_string(),
            header_row: 0,
            required_columns: Vec::new(),
            target_table: "tgt_table".to_string(),
            target_field: "tgt_attribute".to_string(),
            target_datatype: "tgt_attr_datatype".to_string(),
            mandatory_flag: "tgt_attr_mandatory".to_string(),
            pk_flags: "tgt_pk".to_string(),
            source_table: "src_table".to_string(),
            source_field: "src_attr".to_string(),
            source_datatype: "src_attr_datatype".to_string(),
            expression: "expression".to_string(),
            conversion_type: "attr:conversion_type".to_string(),
            bk_schema: "attr:bk_schema".to_string(),
            bk_object: "attr:bk_object".to_string(),
            null_default: "attr:nulldefault".to_string(),
            algorithm_id: "algorithm_uid".to_string(),
            subalgorithm_id: "subalgorithm_uid".to_string(),
            mapping_version_to: "mapping_ver_to".to_string(),
        }
    }
}

impl MappingSheet {
    pub fn essential_columns(&self) -> Vec<&str> {
        vec![
            self.target_table.as_str(),
            self.target_field.as_str(),
            self.target_datatype.as_str(),
            self.mandatory_flag.as_str(),
            self.pk_flags.as_str(),
            self.source_table.as_str(),
            self.source_field.as_str(),
            self.source_datatype.as_str(),
            self.expression.as_str(),
            self.conversion_type.as_str(),
            self.bk_schema.as_str(),
            self.bk_object.as_str(),
            self.null_default.as_str(),
            self.algorithm_id.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatatypeConfig {
    pub source: BTreeSet<String>,
    pub target: BTreeSet<String>,
    /// Datatype rewrites applied before validation, e.g. `"char(32)" = "text"`.
    pub aliases: BTreeMap<String, String>,
}

impl DatatypeConfig {
    /// Lower-cased datatype with aliases applied.
    pub fn canonical(&self, datatype: &str) -> String {
        let lowered = datatype.trim().to_lowercase();
        self.aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(&lowered))
            .map(|(_, canonical)| canonical.to_lowercase())
            .unwrap_or(lowered)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub field_name: Pattern,
    pub target_table: Pattern,
    pub source_table: Pattern,
    pub hub_table: Pattern,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            field_name: builtin(DEFAULT_FIELD_NAME_PATTERN),
            target_table: builtin(DEFAULT_TABLE_NAME_PATTERN),
            source_table: builtin(DEFAULT_TABLE_NAME_PATTERN),
            hub_table: builtin(DEFAULT_HUB_TABLE_PATTERN),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PredefinedFields {
    pub target: Vec<PredefinedTargetField>,
    pub source: Vec<PredefinedSourceField>,
}

/// A target field every table must declare exactly once, exactly like this.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PredefinedTargetField {
    pub name: String,
    pub datatype: String,
    /// `null` or `not null`.
    pub mandatory: String,
}

/// A source field every source table must carry exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PredefinedSourceField {
    pub name: String,
    pub datatype: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub hash_ignore: BTreeSet<String>,
    pub distribution_ignore: BTreeSet<String>,
}

/// A field appended to every field map after the sheet-derived entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtraField {
    pub name: String,
    pub kind: FieldMapKind,
    pub value: String,
    pub datatype: String,
    /// Only inject for this capture mode; always when absent.
    #[serde(default)]
    pub capture_mode: Option<DataCaptureMode>,
}

impl ExtraField {
    pub fn applies_to(&self, mode: DataCaptureMode) -> bool {
        self.capture_mode.is_none_or(|only| only == mode)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TypeCompatibility {
    pub pairs: Vec<TypePair>,
    /// Suffix of generic identifier source fields, e.g. `customer_id`.
    pub identifier_suffix: String,
    /// Suffix of reference target fields, e.g. `customer_rk`.
    pub reference_suffix: String,
}

impl Default for TypeCompatibility {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            identifier_suffix: "_id".to_string(),
            reference_suffix: "_rk".to_string(),
        }
    }
}

impl TypeCompatibility {
    pub fn allows(&self, source_type: &str, target_type: &str) -> bool {
        self.pairs
            .iter()
            .any(|pair| pair.source == source_type && pair.target == target_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypePair {
    pub source: String,
    pub target: String,
}

/// Behaviour that differs between source systems.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceSystemProfile {
    /// Boolean SQL testing the delete marker of an increment row.
    pub delete_marker: Option<String>,
    /// Technical columns the source system adds to every source table.
    pub technical_fields: Vec<TechnicalField>,
    /// Source fields required for tables of this system only.
    pub required_fields: Vec<PredefinedSourceField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TechnicalField {
    pub name: String,
    pub datatype: String,
    #[serde(default)]
    pub capture_mode: Option<DataCaptureMode>,
}

impl TechnicalField {
    pub fn applies_to(&self, mode: DataCaptureMode) -> bool {
        self.capture_mode.is_none_or(|only| only == mode)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// A flow is generated only when its name matches one of these; all
    /// flows are generated when the list is empty.
    pub filters: Vec<Pattern>,
    /// Target field whose expression carries the source code.
    pub source_code_field: String,
    /// Name of the synthesized deleted flag for increment loads.
    pub deleted_flag_field: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            source_code_field: DEFAULT_SOURCE_CODE_FIELD.to_string(),
            deleted_flag_field: "deleted_flg".to_string(),
        }
    }
}

impl WorkflowConfig {
    pub fn accepts(&self, flow_name: &str) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|p| p.is_match(flow_name))
    }
}
