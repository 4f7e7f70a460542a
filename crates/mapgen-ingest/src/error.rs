use std::path::PathBuf;

use mapgen_model::MappingError;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sheet `{sheet}`: {source}")]
    Csv {
        sheet: String,
        #[source]
        source: csv::Error,
    },

    #[error("workbook has no sheet named `{0}`")]
    MissingSheet(String),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
