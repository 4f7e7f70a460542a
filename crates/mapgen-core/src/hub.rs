//! Hub reference resolution.
//!
//! Rows whose conversion type is `hub` point at a reference table. Each one
//! becomes a [`HubFieldDescriptor`] with a platform-safe short name and the
//! foreign-key field derived from the referencing field.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use mapgen_model::{HubFieldDescriptor, MappingError, PkFlag, RawMappingRow};

use crate::BuildContext;

/// Longest prefix of the hub table name kept in a synthesized short name.
const SHORT_NAME_STEM_LEN: usize = 12;
const SHORT_NAME_SUFFIX_LEN: usize = 5;
/// Attempts at a synthesized short name not yet used by the table.
const SHORT_NAME_ATTEMPTS: usize = 16;

/// Source of the random suffix in synthesized hub short names.
pub trait NameGenerator {
    /// `len` lower-case ASCII letters.
    fn random_suffix(&mut self, len: usize) -> String;
}

/// Thread-local RNG backed generator used for real runs.
#[derive(Debug, Default)]
pub struct RandomNameGenerator;

impl NameGenerator for RandomNameGenerator {
    fn random_suffix(&mut self, len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
    }
}

/// Deterministic generator: `aaaaa`, `aaaab`, `aaaac`, ...
#[derive(Debug, Default)]
pub struct SequentialNameGenerator {
    counter: u64,
}

impl SequentialNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameGenerator for SequentialNameGenerator {
    fn random_suffix(&mut self, len: usize) -> String {
        let mut value = self.counter;
        self.counter += 1;
        let mut letters = vec![b'a'; len];
        for slot in letters.iter_mut().rev() {
            *slot = b'a' + (value % 26) as u8;
            value /= 26;
        }
        letters.into_iter().map(char::from).collect()
    }
}

/// Identifiers the downstream platform accepts as hub short names.
static SHORT_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]{2,22}$").expect("Invalid short name regex"));

pub fn is_valid_short_name(name: &str) -> bool {
    SHORT_NAME_REGEX.is_match(name)
}

/// `customer_rk` -> `customer_id`, `customer_code` -> `customer_code_id`.
pub fn foreign_key_field(field: &str) -> String {
    match field.strip_suffix("_rk") {
        Some(stem) => format!("{stem}_id"),
        None => format!("{field}_id"),
    }
}

/// Drop the leading `=` spreadsheet formulas start with.
pub fn strip_formula_prefix(expression: &str) -> &str {
    let trimmed = expression.trim();
    trimmed.strip_prefix('=').map_or(trimmed, str::trim_start)
}

pub struct HubResolver<'a, 'g> {
    ctx: BuildContext<'a>,
    names: &'g mut dyn NameGenerator,
    synthesized: BTreeSet<String>,
}

impl<'a, 'g> HubResolver<'a, 'g> {
    pub fn new(ctx: BuildContext<'a>, names: &'g mut dyn NameGenerator) -> Self {
        Self {
            ctx,
            names,
            synthesized: BTreeSet::new(),
        }
    }

    /// Resolve every hub row of the table, sorted by referencing field.
    ///
    /// The first row with a bad role token or hub reference aborts the
    /// table with a `StructuralData` error.
    pub fn resolve(
        &mut self,
        rows: &[&RawMappingRow],
    ) -> Result<Vec<HubFieldDescriptor>, MappingError> {
        let mut hubs = Vec::new();
        for row in rows.iter().filter(|row| row.is_hub()) {
            hubs.push(self.resolve_row(row)?);
        }
        hubs.sort_by(|a, b| a.source_field_name.cmp(&b.source_field_name));
        tracing::debug!(hubs = hubs.len(), "hub fields resolved");
        Ok(hubs)
    }

    fn resolve_row(&mut self, row: &RawMappingRow) -> Result<HubFieldDescriptor, MappingError> {
        let table = self.ctx.table;
        let config = self.ctx.config;
        let role = business_key_role(row).map_err(|message| {
            MappingError::structural(table, format!("{}: {message}", row.label()))
        })?;

        let pattern = &config.naming.hub_table;
        let qualified = row.bk_object.as_deref().unwrap_or_default();
        if !pattern.is_match(qualified) {
            return Err(MappingError::structural(
                table,
                format!(
                    "{}: hub reference `{qualified}` does not match `{pattern}`",
                    row.label()
                ),
            ));
        }
        let Some((hub_schema, hub_table_name)) = qualified.split_once('.') else {
            return Err(MappingError::structural(
                table,
                format!("{}: hub reference `{qualified}` has no schema", row.label()),
            ));
        };
        let Some(business_key_schema) = row.bk_schema.clone() else {
            return Err(MappingError::structural(
                table,
                format!("{}: hub row has no business-key schema", row.label()),
            ));
        };

        let datatypes = &config.datatypes;
        Ok(HubFieldDescriptor {
            source_field_name: row.target_field.clone(),
            business_key_schema,
            qualified_hub_table: qualified.to_string(),
            null_default_policy: row.null_default.clone(),
            source_attribute: row.source_field.clone(),
            expression: row
                .expression
                .as_deref()
                .map(strip_formula_prefix)
                .filter(|expr| !expr.is_empty())
                .map(str::to_string),
            hub_schema: hub_schema.to_string(),
            hub_table_name: hub_table_name.to_string(),
            hub_short_name: self.short_name(hub_table_name),
            hub_foreign_key_field: foreign_key_field(&row.target_field),
            is_business_key: role == PkFlag::Bk,
            target_datatype: datatypes.canonical(&row.target_datatype),
            source_datatype: row
                .source_datatype
                .as_deref()
                .map(|datatype| datatypes.canonical(datatype)),
        })
    }

    /// The bare hub table name when the platform accepts it, otherwise
    /// `hub_<stem>_<suffix>` with a suffix not yet used in this table.
    fn short_name(&mut self, hub_table_name: &str) -> String {
        if is_valid_short_name(hub_table_name) {
            return hub_table_name.to_string();
        }
        let stem: String = hub_table_name
            .strip_prefix("hub_")
            .unwrap_or(hub_table_name)
            .chars()
            .take(SHORT_NAME_STEM_LEN)
            .collect();
        let mut candidate = String::new();
        for _ in 0..SHORT_NAME_ATTEMPTS {
            candidate = format!(
                "hub_{stem}_{}",
                self.names.random_suffix(SHORT_NAME_SUFFIX_LEN)
            );
            if !self.synthesized.contains(&candidate) {
                break;
            }
        }
        tracing::debug!(hub = %hub_table_name, short_name = %candidate, "synthesized hub short name");
        self.synthesized.insert(candidate.clone());
        candidate
    }
}

/// The row's key tokens other than `rk` must be exactly one of `pk` or `bk`.
fn business_key_role(row: &RawMappingRow) -> Result<PkFlag, String> {
    let tokens: Vec<&str> = row
        .pk_flags
        .iter()
        .map(String::as_str)
        .filter(|token| *token != PkFlag::Rk.as_str())
        .collect();
    match tokens.as_slice() {
        [token] => match token.parse::<PkFlag>() {
            Ok(flag @ (PkFlag::Pk | PkFlag::Bk)) => Ok(flag),
            _ => Err(format!("hub role `{token}` must be `pk` or `bk`")),
        },
        [] => Err("hub row has no `pk` or `bk` role".to_string()),
        many => Err(format!(
            "hub row has more than one role: {}",
            many.join(", ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_boundaries() {
        assert!(is_valid_short_name("abc"));
        assert!(!is_valid_short_name("ab"));
        assert!(is_valid_short_name(&format!("a{}", "b".repeat(22))));
        assert!(!is_valid_short_name(&format!("a{}", "b".repeat(23))));
        assert!(!is_valid_short_name("1abc"));
        assert!(!is_valid_short_name("hub-orders"));
    }

    #[test]
    fn foreign_keys_follow_reference_suffix() {
        assert_eq!(foreign_key_field("customer_rk"), "customer_id");
        assert_eq!(foreign_key_field("customer_code"), "customer_code_id");
    }

    #[test]
    fn formula_prefix_is_stripped_once() {
        assert_eq!(strip_formula_prefix("=upper(code)"), "upper(code)");
        assert_eq!(strip_formula_prefix("upper(code)"), "upper(code)");
    }

    #[test]
    fn sequential_generator_counts_in_letters() {
        let mut names = SequentialNameGenerator::new();
        assert_eq!(names.random_suffix(5), "aaaaa");
        assert_eq!(names.random_suffix(5), "aaaab");
        assert_eq!(names.random_suffix(3), "aac");
    }

    #[test]
    fn random_generator_yields_lowercase_letters() {
        let suffix = RandomNameGenerator.random_suffix(5);
        assert_eq!(suffix.len(), 5);
        assert!(suffix.bytes().all(|b| b.is_ascii_lowercase()));
    }

    #[test]
    fn role_token_ignores_reference_flag() {
        let row = RawMappingRow {
            pk_flags: vec!["rk".to_string(), "bk".to_string()],
            ..RawMappingRow::default()
        };
        assert_eq!(business_key_role(&row), Ok(PkFlag::Bk));

        let row = RawMappingRow {
            pk_flags: vec!["pk".to_string(), "bk".to_string()],
            ..RawMappingRow::default()
        };
        assert!(business_key_role(&row).is_err());
    }
}
