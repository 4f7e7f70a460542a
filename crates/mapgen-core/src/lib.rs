//! Builds validated source, target and mapping contexts for each target
//! table of a mapping workbook.
//!
//! The per-table pipeline is linear: read the table's metadata, validate
//! target and source fields, resolve hub references, assemble the field map
//! and finally the table contexts. A failure stops that table only; the run
//! driver records it and continues with the next one.

#![deny(unsafe_code)]

pub mod assemble;
pub mod catalog;
pub mod context;
pub mod hub;
pub mod pipeline;
pub mod run;
pub mod tables;

pub use assemble::MappingContextAssembler;
pub use catalog::{FieldCatalog, FieldCatalogBuilder};
pub use context::BuildContext;
pub use hub::{
    HubResolver, NameGenerator, RandomNameGenerator, SequentialNameGenerator,
    foreign_key_field, is_valid_short_name, strip_formula_prefix,
};
pub use pipeline::build_table;
pub use run::{RunOptions, RunReport, TableOutcome, TableReport, run, run_from_reader};
pub use tables::{source_context, target_context};
