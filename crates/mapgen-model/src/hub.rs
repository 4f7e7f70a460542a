use serde::Serialize;

/// A reference ("hub") pointer carried by a target table.
///
/// Built by the hub resolver from rows whose conversion type is `hub`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubFieldDescriptor {
    /// Target-table field that carries the hub reference.
    pub source_field_name: String,
    pub business_key_schema: String,
    /// Hub table as written in the sheet, `schema.table`.
    pub qualified_hub_table: String,
    pub null_default_policy: Option<String>,
    /// Source column feeding the business key, when one is mapped.
    pub source_attribute: Option<String>,
    pub expression: Option<String>,
    pub hub_schema: String,
    pub hub_table_name: String,
    /// Identifier accepted by the downstream platform, `^[a-z][a-z0-9_]{2,22}$`.
    pub hub_short_name: String,
    pub hub_foreign_key_field: String,
    pub is_business_key: bool,
    pub target_datatype: String,
    pub source_datatype: Option<String>,
}
