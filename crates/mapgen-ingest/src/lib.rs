//! Mapping workbook ingestion.
//!
//! Reads the table catalog and field-mapping sheets through a [`SheetReader`],
//! normalizes headers and values, checks the required columns and produces
//! typed rows for the builder.

#![deny(unsafe_code)]

pub mod error;
pub mod rows;
pub mod sheet;
pub mod workbook;

pub use error::IngestError;
pub use rows::{MappingWorkbook, read_catalog, read_mapping_rows, split_pk_flags};
pub use sheet::{Sheet, normalize_header};
pub use workbook::{CsvWorkbook, RawSheet, SheetReader, SheetRow};
