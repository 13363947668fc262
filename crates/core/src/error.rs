//! Error types for GreenSeries

use thiserror::Error;

/// Main error type for GreenSeries operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// A band required by a stage is absent from an image or composite.
    #[error("Missing band '{band}' in {source_name}")]
    MissingBand { band: String, source_name: String },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::MissingBand`].
    pub fn missing_band(band: impl Into<String>, source_name: impl Into<String>) -> Self {
        Error::MissingBand {
            band: band.into(),
            source_name: source_name.into(),
        }
    }
}

/// Result type alias for GreenSeries operations
pub type Result<T> = std::result::Result<T, Error>;
