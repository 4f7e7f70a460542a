//! Target and source field catalogs of one target table.
//!
//! Every rule violation is pushed into a shared [`Violations`] value so the
//! caller sees the complete defect list for the table in a single
//! `FieldValidation` error.

use std::collections::BTreeMap;

use mapgen_config::PredefinedSourceField;
use mapgen_model::{
    Diagnostics, FieldDescriptor, MANDATORY_NOT_NULL, MANDATORY_NULL, MappingError, PkFlag,
    RawMappingRow, Violations, WarningKind,
};

use crate::BuildContext;

/// Validated field lists of one target table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    pub target_fields: Vec<FieldDescriptor>,
    pub source_fields: Vec<FieldDescriptor>,
}

pub struct FieldCatalogBuilder<'a> {
    ctx: BuildContext<'a>,
}

impl<'a> FieldCatalogBuilder<'a> {
    pub fn new(ctx: BuildContext<'a>) -> Self {
        Self { ctx }
    }

    /// Validate both field lists and run the type-compatibility cross-check.
    ///
    /// Fails with one `FieldValidation` error carrying every target and
    /// source violation found.
    pub fn build(
        &self,
        rows: &[&RawMappingRow],
        diagnostics: &mut Diagnostics,
    ) -> Result<FieldCatalog, MappingError> {
        let mut violations = Violations::new(self.ctx.table);
        let target_fields = self.target_fields(rows, &mut violations);
        let source_fields = self.source_fields(rows, &mut violations);
        self.check_type_compatibility(rows, diagnostics);
        violations.into_field_validation()?;
        tracing::debug!(
            target_fields = target_fields.len(),
            source_fields = source_fields.len(),
            "field catalog built"
        );
        Ok(FieldCatalog {
            target_fields,
            source_fields,
        })
    }

    /// One descriptor per distinct target field, first occurrence wins.
    pub fn target_fields(
        &self,
        rows: &[&RawMappingRow],
        violations: &mut Violations,
    ) -> Vec<FieldDescriptor> {
        let datatypes = &self.ctx.config.datatypes;
        let naming = &self.ctx.config.naming;
        let mut fields: Vec<FieldDescriptor> = Vec::new();
        let mut nullable_keys = Vec::new();

        for row in rows {
            if row.target_field.is_empty() {
                violations.push(format!("{}: target field name is empty", row.label()));
                continue;
            }
            let datatype = datatypes.canonical(&row.target_datatype);
            let mut valid = true;
            if datatype.is_empty() {
                violations.push(format!("{}: target datatype is empty", row.label()));
                valid = false;
            } else if !datatypes.target.is_empty() && !datatypes.target.contains(&datatype) {
                violations.push(format!(
                    "{}: target datatype `{datatype}` is not allowed",
                    row.label()
                ));
                valid = false;
            }
            let mandatory = row.mandatory();
            if mandatory != MANDATORY_NULL && mandatory != MANDATORY_NOT_NULL {
                violations.push(format!(
                    "{}: mandatory flag `{mandatory}` must be `{MANDATORY_NULL}` or `{MANDATORY_NOT_NULL}`",
                    row.label()
                ));
                valid = false;
            }
            for token in &row.pk_flags {
                if token.parse::<PkFlag>().is_err() {
                    violations.push(format!("{}: unknown key flag `{token}`", row.label()));
                    valid = false;
                }
            }
            let is_primary_key = row.has_flag(PkFlag::Pk);
            if is_primary_key && !row.is_not_null() {
                nullable_keys.push(row.label());
            }

            let descriptor = FieldDescriptor {
                name: row.target_field.clone(),
                datatype,
                is_nullable: !row.is_not_null(),
                is_primary_key,
                comment: None,
            };
            match fields.iter().find(|field| field.name == descriptor.name) {
                Some(existing) if valid && existing != &descriptor => {
                    violations.push(format!(
                        "{}: target field `{}` redefined with a different datatype, mandatory or key flag",
                        row.label(),
                        descriptor.name
                    ));
                }
                Some(_) => {}
                None => {
                    if !naming.field_name.is_match(&descriptor.name) {
                        violations.push(format!(
                            "{}: target field name does not match `{}`",
                            row.label(),
                            naming.field_name
                        ));
                    }
                    fields.push(descriptor);
                }
            }
        }

        if !nullable_keys.is_empty() {
            violations.push(format!(
                "primary-key fields must be `{MANDATORY_NOT_NULL}`: {}",
                nullable_keys.join(", ")
            ));
        }
        self.check_predefined_targets(rows, violations);
        fields
    }

    fn check_predefined_targets(&self, rows: &[&RawMappingRow], violations: &mut Violations) {
        let datatypes = &self.ctx.config.datatypes;
        for required in &self.ctx.config.predefined.target {
            let declared: Vec<&&RawMappingRow> = rows
                .iter()
                .filter(|row| row.target_field == required.name)
                .collect();
            match declared.as_slice() {
                [] => violations.push(format!(
                    "predefined target field `{}` is missing",
                    required.name
                )),
                [row] => {
                    let datatype = datatypes.canonical(&row.target_datatype);
                    let expected = datatypes.canonical(&required.datatype);
                    if datatype != expected || row.mandatory() != required.mandatory {
                        violations.push(format!(
                            "{}: predefined target field `{}` must be `{expected} {}`, found `{datatype} {}`",
                            row.label(),
                            required.name,
                            required.mandatory,
                            row.mandatory()
                        ));
                    }
                }
                many => violations.push(format!(
                    "predefined target field `{}` is declared {} times",
                    required.name,
                    many.len()
                )),
            }
        }
    }

    /// One descriptor per distinct source field, first occurrence wins.
    pub fn source_fields(
        &self,
        rows: &[&RawMappingRow],
        violations: &mut Violations,
    ) -> Vec<FieldDescriptor> {
        let datatypes = &self.ctx.config.datatypes;
        let naming = &self.ctx.config.naming;
        let mut fields: Vec<FieldDescriptor> = Vec::new();
        // Every datatype each source field was declared with, in order.
        let mut declared: BTreeMap<&str, Vec<String>> = BTreeMap::new();

        for row in rows {
            let Some(name) = row.source_field.as_deref() else {
                continue;
            };
            let Some(raw_datatype) = row.source_datatype.as_deref() else {
                violations.push(format!(
                    "{}: source field `{name}` has no datatype",
                    row.label()
                ));
                continue;
            };
            let datatype = datatypes.canonical(raw_datatype);
            let seen = declared.entry(name).or_default();
            if !seen.contains(&datatype) {
                seen.push(datatype.clone());
            }
            if fields.iter().any(|field| field.name == name) {
                continue;
            }
            if !datatypes.source.is_empty() && !datatypes.source.contains(&datatype) {
                violations.push(format!(
                    "{}: source datatype `{datatype}` is not allowed",
                    row.label()
                ));
            }
            if !naming.field_name.is_match(name) {
                violations.push(format!(
                    "{}: source field name `{name}` does not match `{}`",
                    row.label(),
                    naming.field_name
                ));
            }
            fields.push(FieldDescriptor::new(name, datatype));
        }

        for (name, types) in &declared {
            if types.len() > 1 {
                violations.push(format!(
                    "source field `{name}` is declared with conflicting datatypes: {}",
                    types.join(", ")
                ));
            }
        }
        for required in self.required_source_fields() {
            let expected = datatypes.canonical(&required.datatype);
            match declared.get(required.name.as_str()) {
                None => violations.push(format!(
                    "required source field `{}` is missing",
                    required.name
                )),
                Some(types) if types.len() == 1 && types[0] != expected => {
                    violations.push(format!(
                        "required source field `{}` must be `{expected}`, found `{}`",
                        required.name, types[0]
                    ));
                }
                Some(_) => {}
            }
        }
        fields
    }

    fn required_source_fields(&self) -> impl Iterator<Item = &PredefinedSourceField> {
        let profile_fields = self
            .ctx
            .profile
            .map(|profile| profile.required_fields.as_slice())
            .unwrap_or_default();
        self.ctx
            .config
            .predefined
            .source
            .iter()
            .chain(profile_fields)
    }

    /// Warn about source/target datatype pairs outside the compatibility table.
    ///
    /// Skipped entirely when no pairs are configured.
    pub fn check_type_compatibility(&self, rows: &[&RawMappingRow], diagnostics: &mut Diagnostics) {
        let compatibility = &self.ctx.config.type_compatibility;
        if compatibility.pairs.is_empty() {
            return;
        }
        let datatypes = &self.ctx.config.datatypes;
        for row in rows {
            let (Some(source_field), Some(source_datatype)) =
                (row.source_field.as_deref(), row.source_datatype.as_deref())
            else {
                continue;
            };
            if row.target_field.is_empty() || row.target_datatype.is_empty() {
                continue;
            }
            let source_type = datatypes.canonical(source_datatype);
            let target_type = datatypes.canonical(&row.target_datatype);
            if compatibility.allows(&source_type, &target_type) {
                continue;
            }
            let identifier_to_reference = source_field.ends_with(&compatibility.identifier_suffix)
                && row.target_field.ends_with(&compatibility.reference_suffix)
                && source_type == "string"
                && target_type == "bigint";
            if identifier_to_reference {
                continue;
            }
            let message = format!(
                "{}: `{source_field}` {source_type} is not compatible with `{}` {target_type}",
                row.label(),
                row.target_field
            );
            tracing::warn!(table = %self.ctx.table, "{message}");
            diagnostics.warn(WarningKind::TypeCompatibility, self.ctx.table, message);
        }
    }
}
