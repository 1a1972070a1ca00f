//! The imagery archive collaborator
//!
//! The engine never touches pixels itself. It asks an archive two things:
//! how many frames match a query, and the per-pixel median of those frames.
//! Masking, cloud filtering and reduction all happen on the archive side.

mod local;
mod manifest;

pub use local::{CatalogFrame, LocalArchive};
pub use manifest::{FrameManifest, ManifestEntry};

use serde::{Deserialize, Serialize};
use strata_core::{RasterFrame, Region};

use crate::error::ArchiveError;
use crate::period::DateRange;

/// What a masked tier's availability count measures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskedAvailability {
    /// Frames matching the window. Masking is per pixel and removes no
    /// frames, so a masked tier sees the same count as its unmasked twin.
    #[default]
    FrameCount,
    /// Frames whose share of region pixels surviving the QA mask is at
    /// least the given fraction.
    ValidCoverage(f64),
}

/// Archive-side filtering shared by every query of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Scenes above this cloud cover percentage are excluded
    pub max_cloud_cover: f64,
    pub masked_availability: MaskedAvailability,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_cloud_cover: 90.0,
            masked_availability: MaskedAvailability::FrameCount,
        }
    }
}

/// One declarative archive request.
///
/// `sources` are merged: a count covers frames from any of them and a
/// composite reduces their union.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameQuery {
    pub sources: Vec<String>,
    pub range: DateRange,
    pub region: Region,
    pub masked: bool,
    pub options: QueryOptions,
}

/// Counts frames without materializing them.
pub trait AvailabilityArchive {
    /// Number of frames matching `query`. An unreachable archive is an
    /// error, never zero.
    fn query_count(&self, query: &FrameQuery) -> Result<u64, ArchiveError>;
}

/// An archive that can also reduce matching frames to a composite.
pub trait ImageryArchive: AvailabilityArchive {
    /// Per-pixel median of the matching frames, bands under their native
    /// names.
    fn median_composite(&self, query: &FrameQuery) -> Result<RasterFrame, ArchiveError>;
}

impl<T: AvailabilityArchive + ?Sized> AvailabilityArchive for &T {
    fn query_count(&self, query: &FrameQuery) -> Result<u64, ArchiveError> {
        (**self).query_count(query)
    }
}

impl<T: ImageryArchive + ?Sized> ImageryArchive for &T {
    fn median_composite(&self, query: &FrameQuery) -> Result<RasterFrame, ArchiveError> {
        (**self).median_composite(query)
    }
}
