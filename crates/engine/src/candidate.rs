//! Cascade tiers and the candidates evaluated for them

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_core::{RasterFrame, Region};

use crate::archive::{AvailabilityArchive, ImageryArchive};
use crate::error::{EngineError, Result};
use crate::period::{TimePeriod, WindowRadius};
use crate::prober::AvailabilityProber;
use crate::registry::SourceFamily;

/// One strategy of the fallback cascade, in evaluation order.
///
/// Ordering is total: each window is tried masked before unmasked, and
/// windows widen from the exact year to ±2 years. `Placeholder` is the
/// terminal tier and never queries the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tier {
    ExactMasked,
    ExactUnmasked,
    OneYearMasked,
    OneYearUnmasked,
    TwoYearsMasked,
    TwoYearsUnmasked,
    Placeholder,
}

impl Tier {
    /// Tiers that query the archive, in order
    pub const CASCADE: [Tier; 6] = [
        Tier::ExactMasked,
        Tier::ExactUnmasked,
        Tier::OneYearMasked,
        Tier::OneYearUnmasked,
        Tier::TwoYearsMasked,
        Tier::TwoYearsUnmasked,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0..=5 => Some(Self::CASCADE[index as usize]),
            6 => Some(Self::Placeholder),
            _ => None,
        }
    }

    /// Time window of this tier, `None` for the placeholder
    pub fn radius(self) -> Option<WindowRadius> {
        match self {
            Self::ExactMasked | Self::ExactUnmasked => Some(WindowRadius::Exact),
            Self::OneYearMasked | Self::OneYearUnmasked => Some(WindowRadius::OneYear),
            Self::TwoYearsMasked | Self::TwoYearsUnmasked => Some(WindowRadius::TwoYears),
            Self::Placeholder => None,
        }
    }

    pub fn masked(self) -> bool {
        matches!(
            self,
            Self::ExactMasked | Self::OneYearMasked | Self::TwoYearsMasked
        )
    }

    pub fn is_placeholder(self) -> bool {
        self == Self::Placeholder
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.radius() {
            Some(radius) => write!(
                f,
                "T{} ({radius}, {})",
                self.index(),
                if self.masked() { "masked" } else { "unmasked" }
            ),
            None => write!(f, "T{} (placeholder)", self.index()),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.index()
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(index: u8) -> std::result::Result<Self, String> {
        Tier::from_index(index).ok_or_else(|| format!("tier index {index} out of range 0..=6"))
    }
}

/// A (family, period, masked) combination. The count is looked up at most
/// once; the aggregate is only requested when the candidate is consumed.
#[derive(Debug, Clone)]
pub struct Candidate<'f> {
    family: &'f SourceFamily,
    tier: Tier,
    period: TimePeriod,
    count: Option<u64>,
}

impl<'f> Candidate<'f> {
    /// Candidate for a cascade tier; `None` for the placeholder.
    pub fn new(family: &'f SourceFamily, tier: Tier, year: i32) -> Result<Option<Self>> {
        let Some(radius) = tier.radius() else {
            return Ok(None);
        };
        Ok(Some(Self {
            family,
            tier,
            period: TimePeriod::new(year, radius)?,
            count: None,
        }))
    }

    pub fn family(&self) -> &SourceFamily {
        self.family
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn period(&self) -> TimePeriod {
        self.period
    }

    pub fn masked(&self) -> bool {
        self.tier.masked()
    }

    pub fn count<A: AvailabilityArchive + ?Sized>(
        &mut self,
        prober: &AvailabilityProber<'_, A>,
        region: &Region,
    ) -> Result<u64> {
        if let Some(count) = self.count {
            return Ok(count);
        }
        let count = prober.probe(self.family, &self.period, self.masked(), region)?;
        self.count = Some(count);
        Ok(count)
    }

    /// Consume the candidate and request its median composite
    pub fn into_aggregate<A: ImageryArchive + ?Sized>(
        self,
        prober: &AvailabilityProber<'_, A>,
        region: &Region,
    ) -> Result<RasterFrame> {
        let query = prober.query(self.family, &self.period, self.masked(), region);
        prober
            .archive()
            .median_composite(&query)
            .map_err(|reason| EngineError::Composite {
                sources: query.sources.clone(),
                start: query.range.start,
                end: query.range.end,
                reason,
            })
    }
}
