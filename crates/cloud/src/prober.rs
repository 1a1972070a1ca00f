//! Availability probing against a STAC catalog

use std::sync::Mutex;

use strata_engine::{ArchiveError, AvailabilityArchive, FrameQuery};
use tracing::debug;

use crate::blocking::StacClientBlocking;
use crate::cache::CountCache;
use crate::error::{CloudError, Result};
use crate::sources::{StacConfig, StacSourceMap};
use crate::stac_client::StacClientOptions;

/// An [`AvailabilityArchive`] answering counts from STAC Item Search.
///
/// Pixels are never fetched, so this backs planning only. Each archive
/// source of a query is searched separately and the counts are summed.
pub struct StacProber {
    client: StacClientBlocking,
    sources: StacSourceMap,
    cache: Mutex<CountCache>,
}

impl StacProber {
    pub fn new(config: StacConfig, options: StacClientOptions) -> Result<Self> {
        Ok(Self {
            client: StacClientBlocking::new(config.catalog, options)?,
            sources: config.sources,
            cache: Mutex::new(CountCache::new(config.cache_capacity)),
        })
    }

    /// Matching items of one archive source.
    pub fn count_source(&self, source: &str, query: &FrameQuery) -> Result<u64> {
        let params = self.sources.search_params(source, query)?;
        let key = params.cache_key();

        let cached = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key);
        if let Some(count) = cached {
            debug!(source, count, "cached STAC count");
            return Ok(count);
        }

        let count = self.client.count(&params)?;
        debug!(source, count, range = %query.range, "STAC count");
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, count);
        Ok(count)
    }
}

impl AvailabilityArchive for StacProber {
    fn query_count(&self, query: &FrameQuery) -> std::result::Result<u64, ArchiveError> {
        query.sources.iter().try_fold(0u64, |total, source| {
            let count = self.count_source(source, query).map_err(|e| match e {
                CloudError::UnknownSource(_) | CloudError::Config(_) => {
                    ArchiveError::InvalidQuery(e.to_string())
                }
                other => ArchiveError::Unreachable(other.to_string()),
            })?;
            Ok(total + count)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use strata_core::{BBox, Region};
    use strata_engine::{
        AvailabilityProber, EngineError, MaskedAvailability, QueryOptions, SourceRegistry,
        TimePeriod, WindowRadius,
    };

    use super::*;
    use crate::stac_client::StacCatalog;

    const L5_T1: &str = "LANDSAT/LT05/C02/T1_L2";
    const L5_T2: &str = "LANDSAT/LT05/C02/T2_L2";

    /// Nothing listens on the discard port, so every request is refused.
    fn closed_catalog() -> StacProber {
        let config = StacConfig {
            catalog: StacCatalog::Custom("http://127.0.0.1:9".into()),
            ..StacConfig::default()
        };
        let options = StacClientOptions {
            request_timeout: Duration::from_secs(2),
            max_retries: 0,
            ..StacClientOptions::default()
        };
        StacProber::new(config, options).unwrap()
    }

    fn region() -> Region {
        Region::new("r", BBox::new(-74.2, 4.5, -74.0, 4.7), 0.01).unwrap()
    }

    fn query(sources: &[&str]) -> FrameQuery {
        FrameQuery {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            range: TimePeriod::new(2005, WindowRadius::OneYear).unwrap().range(),
            region: region(),
            masked: true,
            options: QueryOptions {
                max_cloud_cover: 90.0,
                masked_availability: MaskedAvailability::FrameCount,
            },
        }
    }

    #[test]
    fn unmapped_source_is_invalid_query() {
        let prober = closed_catalog();
        let result = prober.query_count(&query(&["COPERNICUS/S2_SR", L5_T1]));
        assert!(matches!(result, Err(ArchiveError::InvalidQuery(_))));
    }

    #[test]
    fn refused_connection_is_unreachable() {
        let prober = closed_catalog();
        let result = prober.query_count(&query(&[L5_T1]));
        assert!(matches!(result, Err(ArchiveError::Unreachable(_))));
    }

    #[test]
    fn unreachable_catalog_fails_availability_check() {
        let prober = closed_catalog();
        let registry = SourceRegistry::landsat_c2();
        let family = registry.get("L5").unwrap();
        let period = TimePeriod::new(2005, WindowRadius::Exact).unwrap();

        let checker = AvailabilityProber::new(&prober, QueryOptions::default());
        match checker.probe(family, &period, true, &region()) {
            Err(EngineError::AvailabilityProbe { sources, reason, .. }) => {
                assert_eq!(sources, family.tiers);
                assert!(matches!(reason, ArchiveError::Unreachable(_)));
            }
            other => panic!("expected an availability failure, got {other:?}"),
        }
    }

    #[test]
    fn tier_counts_are_summed_from_cache() {
        let prober = closed_catalog();
        let q = query(&[L5_T1, L5_T2]);
        for (source, count) in [(L5_T1, 3), (L5_T2, 4)] {
            let key = prober.sources.search_params(source, &q).unwrap().cache_key();
            prober.cache.lock().unwrap().insert(key, count);
        }

        assert_eq!(prober.count_source(L5_T2, &q).unwrap(), 4);
        assert_eq!(prober.query_count(&q).unwrap(), 7);
    }
}
