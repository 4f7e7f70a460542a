//! Assembled per-table contexts handed to renderers.
//!
//! Renderers bind to these structures by field name, so every type here is
//! `Serialize` and field names are part of the output contract.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{DataCaptureMode, FieldDescriptor, FieldMapEntry, HubFieldDescriptor, TableIdent};

/// Source table of a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceContext {
    #[serde(flatten)]
    pub table: TableIdent,
    pub fields: Vec<FieldDescriptor>,
    pub data_capture_mode: DataCaptureMode,
    pub source_system: String,
}

/// Target table of a load with its derived key sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetContext {
    #[serde(flatten)]
    pub table: TableIdent,
    pub fields: Vec<FieldDescriptor>,
    pub hub_fields: Vec<HubFieldDescriptor>,
    pub hash_fields: BTreeSet<String>,
    pub distribution_key_fields: BTreeSet<String>,
    /// Qualified names of every hub table referenced by this table.
    pub hub_tables: BTreeSet<String>,
    pub source_code: String,
    pub actual_dttm_field: String,
}

/// Ignore lists applied when deriving hash and distribution key fields.
#[derive(Debug, Clone, Copy)]
pub struct KeyIgnoreLists<'a> {
    pub hash: &'a BTreeSet<String>,
    pub distribution: &'a BTreeSet<String>,
}

impl TargetContext {
    /// Build the target context, deriving the hash and distribution key sets.
    ///
    /// - hash fields: all fields minus not-null fields, the hash ignore list
    ///   and every hub reference field;
    /// - distribution keys: primary-key fields minus the distribution ignore
    ///   list and every hub reference field.
    pub fn new(
        table: TableIdent,
        fields: Vec<FieldDescriptor>,
        hub_fields: Vec<HubFieldDescriptor>,
        ignore: KeyIgnoreLists<'_>,
        source_code: &str,
    ) -> Self {
        let hub_refs = hub_reference_fields(&hub_fields);
        let hash_fields = fields
            .iter()
            .filter(|field| field.is_nullable)
            .map(|field| field.name.clone())
            .filter(|name| !ignore.hash.contains(name) && !hub_refs.contains(name))
            .collect();
        let distribution_key_fields = fields
            .iter()
            .filter(|field| field.is_primary_key)
            .map(|field| field.name.clone())
            .filter(|name| !ignore.distribution.contains(name) && !hub_refs.contains(name))
            .collect();
        let hub_tables = hub_fields
            .iter()
            .map(|hub| hub.qualified_hub_table.clone())
            .collect();
        let source_code = source_code.to_lowercase();
        let actual_dttm_field = format!("{source_code}_actual_dttm");
        Self {
            table,
            fields,
            hub_fields,
            hash_fields,
            distribution_key_fields,
            hub_tables,
            source_code,
            actual_dttm_field,
        }
    }

    pub fn primary_key_fields(&self) -> BTreeSet<String> {
        self.fields
            .iter()
            .filter(|field| field.is_primary_key)
            .map(|field| field.name.clone())
            .collect()
    }

    pub fn not_null_fields(&self) -> BTreeSet<String> {
        self.fields
            .iter()
            .filter(|field| !field.is_nullable)
            .map(|field| field.name.clone())
            .collect()
    }

    pub fn hub_reference_fields(&self) -> BTreeSet<String> {
        hub_reference_fields(&self.hub_fields)
    }
}

fn hub_reference_fields(hubs: &[HubFieldDescriptor]) -> BTreeSet<String> {
    hubs.iter()
        .flat_map(|hub| {
            [
                hub.source_field_name.clone(),
                hub.hub_foreign_key_field.clone(),
            ]
        })
        .collect()
}

/// Field map and workflow metadata for one load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingContext {
    pub source: TableIdent,
    pub target: TableIdent,
    pub source_code: String,
    pub source_system: String,
    pub algorithm_id: String,
    pub subalgorithm_id: Option<String>,
    pub data_capture_mode: DataCaptureMode,
    /// Flow name without the `wf_` prefix.
    pub workflow_name: String,
    pub field_map: Vec<FieldMapEntry>,
    pub hub_fields: Vec<HubFieldDescriptor>,
}

impl MappingContext {
    pub fn workflow_file(&self) -> String {
        format!("wf_{}", self.workflow_name)
    }

    pub fn control_flow_file(&self) -> String {
        format!("cf_{}", self.workflow_name)
    }

    /// Values available to resource tag templates.
    pub fn tag_values(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("src_cd", self.source_code.clone()),
            ("src_tbl", self.source.name.clone()),
            ("prv", self.source_system.clone()),
            ("tgt", self.target.schema.clone()),
            ("tgt_tbl", self.target.name.clone()),
            ("cf_flow", self.control_flow_file()),
            ("wf_flow", self.workflow_file()),
            ("alg", self.algorithm_id.clone()),
        ])
    }

    pub fn entry(&self, target_field: &str) -> Option<&FieldMapEntry> {
        self.field_map
            .iter()
            .find(|entry| entry.target_field == target_field)
    }
}

/// Everything built for one target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMapping {
    pub source: SourceContext,
    pub target: TargetContext,
    pub mapping: MappingContext,
}
