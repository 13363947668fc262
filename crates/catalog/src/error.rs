//! Error types for the local catalog.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while reading a catalog or its assets.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("item '{id}': invalid bbox {bbox:?}")]
    InvalidBbox { id: String, bbox: Vec<f64> },

    #[error("item '{id}': missing datetime")]
    MissingDatetime { id: String },

    #[error("item '{id}': invalid datetime '{value}': {source}")]
    InvalidDatetime {
        id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("item '{id}': asset '{asset}' ({path}): {source}")]
    Asset {
        id: String,
        asset: String,
        path: PathBuf,
        #[source]
        source: greenseries_core::Error,
    },

    #[error("core error: {0}")]
    Core(#[from] greenseries_core::Error),
}

impl From<CatalogError> for greenseries_core::Error {
    fn from(e: CatalogError) -> Self {
        greenseries_core::Error::Archive(e.to_string())
    }
}

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
