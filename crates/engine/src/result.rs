//! Resolved composites and their provenance

use serde::Serialize;
use strata_algorithms::{evi, ndvi, EviParams, SpectralIndex};
use strata_core::{Error as CoreError, Raster, RasterFrame, Region};

use crate::candidate::Tier;
use crate::cascade::TierProbe;
use crate::error::Result;
use crate::period::WindowRadius;
use crate::registry::CanonicalRole;
use crate::validator::RejectedTier;

/// Family label used when nothing, fallback included, produced data.
pub const NO_FAMILY: &str = "none";

/// Which strategy built a composite.
///
/// `tier` is always the tier whose data is in the raster: the placeholder
/// whenever the raster is the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// Family id, fallback group label, or `"none"`
    pub family: String,
    pub tier: Tier,
    pub masked: bool,
    pub succeeded: bool,
    pub year: i32,
    pub window: Option<WindowRadius>,
    pub frame_count: u64,
    /// Tier dropped for a band mismatch in the last attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_tier: Option<Tier>,
}

/// One family's pass through the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyAttempt {
    pub family: String,
    pub fallback: bool,
    pub tier: Tier,
    pub succeeded: bool,
    pub probes: Vec<TierProbe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<RejectedTier>,
}

/// The engine's answer for one (year, product, region) request.
#[derive(Debug, Clone)]
pub struct CompositeResult {
    /// Canonical bands, clipped to `region`
    pub raster: RasterFrame,
    pub provenance: Provenance,
    pub region: Region,
    pub trace: Vec<FamilyAttempt>,
}

impl CompositeResult {
    pub fn succeeded(&self) -> bool {
        self.provenance.succeeded
    }

    /// No family or fallback group produced data
    pub fn is_exhausted(&self) -> bool {
        self.provenance.family == NO_FAMILY
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.raster.band_names()
    }

    fn band(&self, role: CanonicalRole) -> Result<&Raster<f64>> {
        Ok(self
            .raster
            .band(role.as_str())
            .ok_or_else(|| CoreError::MissingBand(role.as_str().to_string()))?)
    }

    /// Derive a spectral index from the canonical bands.
    pub fn index(&self, index: SpectralIndex) -> Result<Raster<f64>> {
        let nir = self.band(CanonicalRole::Nir)?;
        let red = self.band(CanonicalRole::Red)?;
        let raster = match index {
            SpectralIndex::Ndvi => ndvi(nir, red)?,
            SpectralIndex::Evi => {
                let blue = self.band(CanonicalRole::Blue)?;
                evi(nir, red, blue, EviParams::default())?
            }
        };
        Ok(raster)
    }
}
