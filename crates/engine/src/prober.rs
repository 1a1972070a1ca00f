//! Cheap existence checks against an archive

use strata_core::Region;
use tracing::debug;

use crate::archive::{AvailabilityArchive, FrameQuery, QueryOptions};
use crate::error::{EngineError, Result};
use crate::period::TimePeriod;
use crate::registry::SourceFamily;

/// Counts frames for a (family, period, masked) triple.
///
/// Never requests an aggregate. An archive failure surfaces as
/// [`EngineError::AvailabilityProbe`] and is never read as zero.
#[derive(Debug)]
pub struct AvailabilityProber<'a, A: ?Sized> {
    archive: &'a A,
    options: QueryOptions,
}

impl<'a, A: AvailabilityArchive + ?Sized> AvailabilityProber<'a, A> {
    pub fn new(archive: &'a A, options: QueryOptions) -> Self {
        Self { archive, options }
    }

    pub fn archive(&self) -> &'a A {
        self.archive
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// The query a family's merged tiers issue for `period`
    pub fn query(
        &self,
        family: &SourceFamily,
        period: &TimePeriod,
        masked: bool,
        region: &Region,
    ) -> FrameQuery {
        FrameQuery {
            sources: family.tiers.clone(),
            range: period.range(),
            region: region.clone(),
            masked,
            options: self.options,
        }
    }

    pub fn probe(
        &self,
        family: &SourceFamily,
        period: &TimePeriod,
        masked: bool,
        region: &Region,
    ) -> Result<u64> {
        let query = self.query(family, period, masked, region);
        let count = self
            .archive
            .query_count(&query)
            .map_err(|reason| EngineError::AvailabilityProbe {
                sources: query.sources.clone(),
                start: query.range.start,
                end: query.range.end,
                reason,
            })?;
        debug!(family = %family.id, %period, masked, count, "probe");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use crate::period::WindowRadius;
    use crate::registry::SourceRegistry;
    use std::cell::RefCell;
    use strata_core::BBox;

    struct Fixed(std::result::Result<u64, &'static str>, RefCell<Vec<FrameQuery>>);

    impl AvailabilityArchive for Fixed {
        fn query_count(&self, query: &FrameQuery) -> std::result::Result<u64, ArchiveError> {
            self.1.borrow_mut().push(query.clone());
            self.0.map_err(|e| ArchiveError::Unreachable(e.into()))
        }
    }

    fn region() -> Region {
        Region::new("r", BBox::new(0.0, 0.0, 1.0, 1.0), 0.5).unwrap()
    }

    #[test]
    fn merges_family_tiers() {
        let archive = Fixed(Ok(4), RefCell::new(Vec::new()));
        let prober = AvailabilityProber::new(&archive, QueryOptions::default());
        let registry = SourceRegistry::landsat_c2();
        let period = TimePeriod::new(2005, WindowRadius::OneYear).unwrap();

        let count = prober.probe(registry.get("L5").unwrap(), &period, true, &region()).unwrap();
        assert_eq!(count, 4);

        let queries = archive.1.borrow();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].sources.len(), 2);
        assert!(queries[0].masked);
        assert_eq!(queries[0].range, period.range());
    }

    #[test]
    fn unreachable_is_not_zero() {
        let archive = Fixed(Err("down"), RefCell::new(Vec::new()));
        let prober = AvailabilityProber::new(&archive, QueryOptions::default());
        let registry = SourceRegistry::landsat_c2();
        let period = TimePeriod::new(2005, WindowRadius::Exact).unwrap();

        let err = prober
            .probe(registry.get("L7").unwrap(), &period, false, &region())
            .unwrap_err();
        assert!(matches!(err, EngineError::AvailabilityProbe { .. }));
    }
}
