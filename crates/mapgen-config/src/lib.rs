//! Generator configuration.
//!
//! Loaded once from TOML and read-only afterwards. Regex options are
//! compiled at load time, so an invalid pattern fails the load instead of a
//! later table.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod loader;
pub mod pattern;

pub use config::{
    CatalogSheet, Config, DatatypeConfig, ExtraField, KeyConfig, MappingSheet, NamingConfig,
    PredefinedFields, PredefinedSourceField, PredefinedTargetField, SheetsConfig,
    SourceSystemProfile, TechnicalField, TypeCompatibility, TypePair, WorkflowConfig,
};
pub use error::ConfigError;
pub use loader::{load_config, parse_config};
pub use pattern::Pattern;
