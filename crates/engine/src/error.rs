//! Error types for composite resolution

use chrono::NaiveDate;
use thiserror::Error;

/// Failures reported by an imagery archive collaborator.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive unreachable: {0}")]
    Unreachable(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid manifest {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("raster error: {0}")]
    Raster(#[from] strata_core::Error),
}

/// Errors produced by the resolution engine.
///
/// Only `AvailabilityProbe`, `Composite` and `Config` ever reach a caller of
/// [`CompositeEngine::resolve`](crate::CompositeEngine::resolve).
/// `BandMismatch` is recovered inside the engine and surfaces only in the
/// result trace.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("availability probe failed for {sources:?} over {start}..={end}: {reason}")]
    AvailabilityProbe {
        sources: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
        #[source]
        reason: ArchiveError,
    },

    #[error("composite failed for {sources:?} over {start}..={end}: {reason}")]
    Composite {
        sources: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
        #[source]
        reason: ArchiveError,
    },

    #[error("{label}: composite lacks expected band {band}")]
    BandMismatch { label: String, band: String },

    #[error("unknown source family: {0}")]
    UnknownFamily(String),

    #[error("invalid year {year}: {reason}")]
    InvalidPeriod { year: i32, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("core error: {0}")]
    Core(#[from] strata_core::Error),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
