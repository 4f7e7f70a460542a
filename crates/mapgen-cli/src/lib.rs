//! CLI library components for the mapping context builder.

pub mod build;
pub mod logging;
