//! Error types for the search engine
//!
//! Load failures are fatal to initialization and carry a remediation hint.
//! Per-query failures are local to that call and leave the engine usable.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to bring up a search engine from its storage prefix
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Index file not found at '{}'", path.display())]
    MissingIndex { path: PathBuf },

    #[error("Catalog file not found at '{}'", path.display())]
    MissingCatalog { path: PathBuf },

    #[error("Failed to read index '{}': {source}", path.display())]
    Index {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("Malformed index '{}': {reason}", path.display())]
    MalformedIndex { path: PathBuf, reason: String },

    #[error("Failed to read catalog '{}': {source}", path.display())]
    Catalog { path: PathBuf, source: csv::Error },

    #[error("Malformed catalog '{}': {reason}", path.display())]
    MalformedCatalog { path: PathBuf, reason: String },

    #[error("Index has {index_rows} rows but catalog has {catalog_rows}; they were not built from the same dataset")]
    CardinalityMismatch {
        index_rows: usize,
        catalog_rows: usize,
    },

    #[error("Index stores {index}-dimensional vectors but model '{model}' produces {model_dim}")]
    DimensionMismatch {
        model: String,
        index: usize,
        model_dim: usize,
    },

    #[error("Unknown embedding model '{0}'")]
    UnknownModel(String),
}

impl LoadError {
    /// What the operator should do about it
    pub fn hint(&self) -> &'static str {
        match self {
            Self::MissingIndex { .. }
            | Self::Index { .. }
            | Self::MalformedIndex { .. } => {
                "Run the index builder to (re)create the vector index under the storage prefix"
            }
            Self::MissingCatalog { .. }
            | Self::Catalog { .. }
            | Self::MalformedCatalog { .. } => {
                "Run the index builder to (re)create the catalog table (columns: gadget_name, function)"
            }
            Self::CardinalityMismatch { .. } | Self::DimensionMismatch { .. } => {
                "Rebuild the index and catalog together from the same dataset and model"
            }
            Self::UnknownModel(_) => "Use a supported embedding model identifier (e.g. htp-384)",
        }
    }
}

/// Errors surfaced by the search engine
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

impl SearchError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_index_mentions_path_and_hint() {
        let err = LoadError::MissingIndex {
            path: PathBuf::from("models/gadgets.index"),
        };
        assert!(err.to_string().contains("models/gadgets.index"));
        assert!(err.hint().contains("index builder"));
    }

    #[test]
    fn test_load_error_is_transparent() {
        let err: SearchError = LoadError::CardinalityMismatch {
            index_rows: 3,
            catalog_rows: 2,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Index has 3 rows but catalog has 2; they were not built from the same dataset"
        );
    }
}
