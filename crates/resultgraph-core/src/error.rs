//! Engine error taxonomy.
//!
//! Only shape-level problems surface as errors. Dangling ids inside a result
//! set are logged and skipped where they are encountered, and support cycles
//! are absorbed by the traversal's visited sets.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no usable results (status: {status})")]
    NoUsableResults { status: String },

    #[error("malformed result payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("path `{path_id}` has an invalid subgraph of length {len}")]
    InvalidSubgraph { path_id: String, len: usize },

    #[error("unknown sort key `{0}`")]
    UnknownSortKey(String),

    #[error("invalid ranking policy: heavy weight {heavy} must exceed light weight {light}")]
    InvalidPolicy { heavy: f64, light: f64 },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
