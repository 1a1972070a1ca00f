//! Error types for strata-core

use thiserror::Error;

/// Main error type for raster and frame operations
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

    #[error("Band not found: {0}")]
    MissingBand(String),

    #[error("Duplicate band name: {0}")]
    DuplicateBand(String),

    #[error("Band count mismatch: frame has {have} bands, {want} names given")]
    BandCount { have: usize, want: usize },

    #[error("Region does not intersect raster extent")]
    RegionOutside,

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for strata-core operations
pub type Result<T> = std::result::Result<T, Error>;
