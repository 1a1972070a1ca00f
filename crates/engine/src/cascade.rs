//! The per-family tier cascade
//!
//! Tiers are walked in [`Tier::CASCADE`] order and the walk stops at the
//! first tier with a positive count. Later tiers are neither probed nor
//! aggregated. When no tier qualifies the result is the placeholder: a
//! zero-valued frame in the canonical bands laid out on the region grid.

use serde::Serialize;
use strata_core::{RasterFrame, Region};
use tracing::debug;

use crate::archive::{AvailabilityArchive, ImageryArchive, QueryOptions};
use crate::candidate::{Candidate, Tier};
use crate::error::Result;
use crate::period::TimePeriod;
use crate::prober::AvailabilityProber;
use crate::registry::{BandSpec, SourceFamily};

/// Count observed for one probed tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierProbe {
    pub tier: Tier,
    pub count: u64,
}

/// Which tier a family's cascade settled on, and what it probed on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSelection {
    pub family: String,
    pub tier: Tier,
    /// Window of the selected tier, `None` for the placeholder
    pub period: Option<TimePeriod>,
    pub frame_count: u64,
    pub probes: Vec<TierProbe>,
}

impl TierSelection {
    /// Whether some archive-backed tier had data
    pub fn succeeded(&self) -> bool {
        !self.tier.is_placeholder()
    }
}

/// A selection together with its raw aggregate.
///
/// Band names are native for a real tier and canonical for the
/// placeholder. Nothing has been validated yet.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub selection: TierSelection,
    pub aggregate: RasterFrame,
}

/// Zero-valued frame in `names` on the region grid.
pub fn placeholder<S: AsRef<str>>(names: &[S], region: &Region) -> Result<RasterFrame> {
    let (rows, cols) = region.shape();
    Ok(RasterFrame::constant(
        names,
        0.0,
        rows,
        cols,
        region.transform(),
    )?)
}

pub struct CascadeResolver<'a, A: ?Sized> {
    prober: AvailabilityProber<'a, A>,
}

impl<'a, A: AvailabilityArchive + ?Sized> CascadeResolver<'a, A> {
    pub fn new(archive: &'a A, options: QueryOptions) -> Self {
        Self {
            prober: AvailabilityProber::new(archive, options),
        }
    }

    /// Select a tier using probes only.
    pub fn plan(&self, family: &SourceFamily, year: i32, region: &Region) -> Result<TierSelection> {
        self.select(family, year, region).map(|(selection, _)| selection)
    }

    fn select<'f>(
        &self,
        family: &'f SourceFamily,
        year: i32,
        region: &Region,
    ) -> Result<(TierSelection, Option<Candidate<'f>>)> {
        let mut probes = Vec::with_capacity(Tier::CASCADE.len());
        for tier in Tier::CASCADE {
            let Some(mut candidate) = Candidate::new(family, tier, year)? else {
                continue;
            };
            let count = candidate.count(&self.prober, region)?;
            probes.push(TierProbe { tier, count });
            if count > 0 {
                debug!(family = %family.id, year, %tier, count, "tier selected");
                let selection = TierSelection {
                    family: family.id.clone(),
                    tier,
                    period: Some(candidate.period()),
                    frame_count: count,
                    probes,
                };
                return Ok((selection, Some(candidate)));
            }
        }

        debug!(family = %family.id, year, "cascade exhausted");
        let selection = TierSelection {
            family: family.id.clone(),
            tier: Tier::Placeholder,
            period: None,
            frame_count: 0,
            probes,
        };
        Ok((selection, None))
    }
}

impl<'a, A: ImageryArchive + ?Sized> CascadeResolver<'a, A> {
    /// Select a tier and build its aggregate.
    ///
    /// Only the selected tier is aggregated. Archive failures in either
    /// step abort the resolution.
    pub fn resolve(
        &self,
        family: &SourceFamily,
        year: i32,
        bands: &BandSpec,
        region: &Region,
    ) -> Result<CascadeOutcome> {
        let (selection, candidate) = self.select(family, year, region)?;
        let aggregate = match candidate {
            Some(candidate) => candidate.into_aggregate(&self.prober, region)?,
            None => placeholder(&bands.canonical_names(), region)?,
        };
        Ok(CascadeOutcome {
            selection,
            aggregate,
        })
    }
}
