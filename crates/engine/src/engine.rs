//! The outer cascade over preferred families

use serde::Serialize;
use strata_core::Region;
use tracing::{debug, info, warn};

use crate::archive::{AvailabilityArchive, ImageryArchive};
use crate::candidate::Tier;
use crate::cascade::{placeholder, CascadeResolver};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::registry::{Product, SourceFamily};
use crate::result::{CompositeResult, FamilyAttempt, Provenance, NO_FAMILY};
use crate::validator::{BandValidator, Validated};

/// Outcome of a probe-only walk of the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    pub year: i32,
    /// Family or fallback label that would be used, `"none"` if nothing
    pub family: String,
    pub tier: Tier,
    pub frame_count: u64,
    pub succeeded: bool,
    pub attempts: Vec<FamilyAttempt>,
}

/// Resolves composites against one archive under one configuration.
///
/// Holds no mutable state; concurrent calls on a shared engine are
/// independent.
pub struct CompositeEngine<'a, A: ?Sized> {
    config: &'a EngineConfig,
    archive: &'a A,
}

impl<'a, A: AvailabilityArchive + ?Sized> CompositeEngine<'a, A> {
    pub fn new(config: &'a EngineConfig, archive: &'a A) -> Self {
        Self { config, archive }
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    fn resolver(&self) -> CascadeResolver<'a, A> {
        CascadeResolver::new(self.archive, self.config.options)
    }

    /// Walk the same two-level cascade as [`resolve`](Self::resolve) with
    /// probes only. Nothing is aggregated and no bands are checked.
    pub fn plan(&self, year: i32, region: &Region) -> Result<PlanReport> {
        let resolver = self.resolver();
        let mut attempts = Vec::new();

        if let Some(entry) = self.config.policy.entry_for(year) {
            let mut families = Vec::new();
            for id in &entry.families {
                families.push((self.config.registry.get(id)?.clone(), false));
            }
            if let Some(group) = &entry.fallback {
                families.push((group.merged(&self.config.registry)?, true));
            }

            for (family, fallback) in families {
                let selection = resolver.plan(&family, year, region)?;
                let succeeded = selection.succeeded();
                attempts.push(FamilyAttempt {
                    family: family.id.clone(),
                    fallback,
                    tier: selection.tier,
                    succeeded,
                    probes: selection.probes,
                    rejected: None,
                });
                if succeeded {
                    return Ok(PlanReport {
                        year,
                        family: family.id,
                        tier: selection.tier,
                        frame_count: selection.frame_count,
                        succeeded,
                        attempts,
                    });
                }
            }
        }

        Ok(PlanReport {
            year,
            family: NO_FAMILY.to_string(),
            tier: Tier::Placeholder,
            frame_count: 0,
            succeeded: false,
            attempts,
        })
    }
}

impl<'a, A: ImageryArchive + ?Sized> CompositeEngine<'a, A> {
    /// Best-effort composite of `product` for `year` over `region`.
    ///
    /// Always yields a result when the archive is reachable: preferred
    /// families in order, then the fallback group, then the placeholder
    /// labelled `"none"`. Archive failures are returned as errors.
    pub fn resolve(&self, year: i32, product: Product, region: &Region) -> Result<CompositeResult> {
        let resolver = self.resolver();
        let mut trace = Vec::new();
        let mut last_rejected = None;

        let Some(entry) = self.config.policy.entry_for(year) else {
            warn!(year, "no sensor policy covers year");
            return self.exhausted(year, product, region, trace, None);
        };

        for id in &entry.families {
            let family = self.config.registry.get(id)?;
            let validated = self.attempt(&resolver, family, year, product, region)?;
            last_rejected = validated.rejected.as_ref().map(|r| r.tier);
            trace.push(record(&family.id, false, &validated));
            if validated.succeeded {
                return Ok(self.finish(family.id.clone(), validated, year, region, trace));
            }
        }

        if let Some(group) = &entry.fallback {
            let merged = group.merged(&self.config.registry)?;
            debug!(year, group = %merged.id, "trying fallback group");
            let validated = self.attempt(&resolver, &merged, year, product, region)?;
            last_rejected = validated.rejected.as_ref().map(|r| r.tier);
            trace.push(record(&merged.id, true, &validated));
            if validated.succeeded {
                return Ok(self.finish(merged.id, validated, year, region, trace));
            }
        }

        warn!(year, families = ?entry.families, "every family exhausted its cascade");
        self.exhausted(year, product, region, trace, last_rejected)
    }

    /// Resolve each year in turn, stopping at the first error.
    pub fn resolve_years(
        &self,
        years: &[i32],
        product: Product,
        region: &Region,
    ) -> Result<Vec<CompositeResult>> {
        years
            .iter()
            .map(|&year| self.resolve(year, product, region))
            .collect()
    }

    fn attempt(
        &self,
        resolver: &CascadeResolver<'a, A>,
        family: &SourceFamily,
        year: i32,
        product: Product,
        region: &Region,
    ) -> Result<Validated> {
        let bands = family.band_spec(product)?;
        let outcome = resolver.resolve(family, year, &bands, region)?;
        BandValidator::validate(outcome, &family.id, &bands, region)
    }

    fn finish(
        &self,
        family: String,
        validated: Validated,
        year: i32,
        region: &Region,
        trace: Vec<FamilyAttempt>,
    ) -> CompositeResult {
        let tier = validated.tier;
        info!(
            year,
            family = %family,
            %tier,
            frames = validated.selection.frame_count,
            "composite resolved"
        );
        CompositeResult {
            raster: validated.frame,
            provenance: Provenance {
                family,
                tier,
                masked: tier.masked(),
                succeeded: true,
                year,
                window: tier.radius(),
                frame_count: validated.selection.frame_count,
                rejected_tier: None,
            },
            region: region.clone(),
            trace,
        }
    }

    fn exhausted(
        &self,
        year: i32,
        product: Product,
        region: &Region,
        trace: Vec<FamilyAttempt>,
        rejected_tier: Option<Tier>,
    ) -> Result<CompositeResult> {
        let raster = placeholder(&product.canonical_names(), region)?.clip(region)?;
        Ok(CompositeResult {
            raster,
            provenance: Provenance {
                family: NO_FAMILY.to_string(),
                tier: Tier::Placeholder,
                masked: false,
                succeeded: false,
                year,
                window: None,
                frame_count: 0,
                rejected_tier,
            },
            region: region.clone(),
            trace,
        })
    }
}

fn record(family: &str, fallback: bool, validated: &Validated) -> FamilyAttempt {
    FamilyAttempt {
        family: family.to_string(),
        fallback,
        tier: validated.tier,
        succeeded: validated.succeeded,
        probes: validated.selection.probes.clone(),
        rejected: validated.rejected.clone(),
    }
}
