//! Mapping model types.
//!
//! Everything the builder produces is defined here: table identities, field
//! and hub descriptors, field-map entries, the assembled per-table contexts
//! and the error taxonomy. Values are constructed once per target table and
//! handed to renderers read-only.

#![deny(unsafe_code)]

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod hub;
pub mod ident;
pub mod row;

pub use context::{KeyIgnoreLists, MappingContext, SourceContext, TableMapping, TargetContext};
pub use diagnostics::{Diagnostics, Violations, Warning, WarningKind};
pub use error::{MappingError, ModelError};
pub use field::{DataCaptureMode, FieldDescriptor, FieldMapEntry, FieldMapKind};
pub use hub::HubFieldDescriptor;
pub use ident::TableIdent;
pub use row::{
    CONVERSION_HUB, CatalogRow, MANDATORY_NOT_NULL, MANDATORY_NULL, PkFlag, RawMappingRow,
};
