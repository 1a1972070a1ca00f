//! Band checks, canonical renaming and region clipping

use serde::Serialize;
use strata_core::{RasterFrame, Region};
use tracing::warn;

use crate::candidate::Tier;
use crate::cascade::{placeholder, CascadeOutcome, TierSelection};
use crate::error::{EngineError, Result};
use crate::registry::BandSpec;

/// A tier whose aggregate was dropped for lacking a native band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedTier {
    pub tier: Tier,
    pub band: String,
}

/// A cascade outcome after validation: canonical bands, clipped.
#[derive(Debug, Clone)]
pub struct Validated {
    pub frame: RasterFrame,
    /// Tier that produced `frame`. The placeholder after a mismatch.
    pub tier: Tier,
    pub succeeded: bool,
    pub selection: TierSelection,
    pub rejected: Option<RejectedTier>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BandValidator;

impl BandValidator {
    /// Every expected native band must be present. The first missing one,
    /// in `BandSpec` order, is reported.
    pub fn check(frame: &RasterFrame, label: &str, bands: &BandSpec) -> Result<()> {
        match bands.native.iter().find(|name| !frame.has_band(name)) {
            Some(band) => Err(EngineError::BandMismatch {
                label: label.to_string(),
                band: band.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Rename to canonical roles and clip to `region`.
    ///
    /// A band mismatch replaces the aggregate with the placeholder and marks
    /// the family as failed. Placeholder outcomes pass straight to clipping.
    pub fn validate(
        outcome: CascadeOutcome,
        label: &str,
        bands: &BandSpec,
        region: &Region,
    ) -> Result<Validated> {
        let CascadeOutcome {
            selection,
            aggregate,
        } = outcome;
        let canonical = bands.canonical_names();

        if selection.tier.is_placeholder() {
            return Ok(Validated {
                frame: aggregate.clip(region)?,
                tier: Tier::Placeholder,
                succeeded: false,
                selection,
                rejected: None,
            });
        }

        match Self::check(&aggregate, label, bands) {
            Ok(()) => {
                let frame = aggregate
                    .select_bands(&bands.native)?
                    .rename(&canonical)?
                    .clip(region)?;
                Ok(Validated {
                    frame,
                    tier: selection.tier,
                    succeeded: true,
                    selection,
                    rejected: None,
                })
            }
            Err(EngineError::BandMismatch { label, band }) => {
                warn!(
                    family = %label,
                    tier = %selection.tier,
                    %band,
                    available = ?aggregate.band_names(),
                    "band mismatch, substituting placeholder"
                );
                Ok(Validated {
                    frame: placeholder(&canonical, region)?.clip(region)?,
                    tier: Tier::Placeholder,
                    succeeded: false,
                    rejected: Some(RejectedTier {
                        tier: selection.tier,
                        band,
                    }),
                    selection,
                })
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::TierProbe;
    use crate::registry::{Product, SourceRegistry};
    use strata_core::{BBox, Band, Raster};

    fn region() -> Region {
        Region::new("r", BBox::new(0.0, 0.0, 4.0, 4.0), 1.0).unwrap()
    }

    fn outcome(tier: Tier, bands: &[(&str, f64)]) -> CascadeOutcome {
        let bands = bands
            .iter()
            .map(|(name, v)| {
                let mut r = Raster::filled(6, 6, *v);
                r.set_transform(region().transform());
                Band::new(*name, r)
            })
            .collect();
        CascadeOutcome {
            selection: TierSelection {
                family: "L8".into(),
                tier,
                period: None,
                frame_count: 1,
                probes: vec![TierProbe { tier, count: 1 }],
            },
            aggregate: RasterFrame::from_bands(bands).unwrap(),
        }
    }

    fn spec() -> BandSpec {
        SourceRegistry::landsat_c2()
            .get("L8")
            .unwrap()
            .band_spec(Product::TrueColor)
            .unwrap()
    }

    #[test]
    fn renames_and_clips() {
        let raw = outcome(
            Tier::ExactUnmasked,
            &[("SR_B2", 2.0), ("SR_B4", 4.0), ("SR_B3", 3.0), ("SR_B7", 7.0)],
        );
        let v = BandValidator::validate(raw, "L8", &spec(), &region()).unwrap();
        assert!(v.succeeded);
        assert_eq!(v.tier, Tier::ExactUnmasked);
        assert_eq!(v.frame.band_names(), vec!["R", "G", "B"]);
        assert_eq!(v.frame.shape(), Some((4, 4)));
        assert_eq!(v.frame.band("R").unwrap().get(0, 0).unwrap(), 4.0);
        assert_eq!(v.frame.band("B").unwrap().get(0, 0).unwrap(), 2.0);
    }

    #[test]
    fn mismatch_substitutes_placeholder() {
        let raw = outcome(Tier::OneYearMasked, &[("SR_B3", 3.0), ("SR_B2", 2.0)]);
        let v = BandValidator::validate(raw, "L8", &spec(), &region()).unwrap();
        assert!(!v.succeeded);
        assert_eq!(v.tier, Tier::Placeholder);
        assert_eq!(
            v.rejected,
            Some(RejectedTier {
                tier: Tier::OneYearMasked,
                band: "SR_B4".into()
            })
        );
        assert_eq!(v.frame.band_names(), vec!["R", "G", "B"]);
        assert_eq!(v.frame.band("G").unwrap().get(1, 1).unwrap(), 0.0);
    }

    #[test]
    fn check_names_first_missing_band() {
        let raw = outcome(Tier::ExactMasked, &[("SR_B4", 4.0)]);
        match BandValidator::check(&raw.aggregate, "L8", &spec()) {
            Err(EngineError::BandMismatch { band, .. }) => assert_eq!(band, "SR_B3"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
