//! In-process archive over a catalog of decoded frames

use chrono::NaiveDate;
use strata_algorithms::landsat::{apply_qa_mask, valid_fraction, QaMask, ReflectanceScale, QA_PIXEL};
use strata_algorithms::median_composite;
use strata_core::RasterFrame;
use tracing::debug;

use super::{AvailabilityArchive, FrameQuery, ImageryArchive, MaskedAvailability};
use crate::error::ArchiveError;

/// One timestamped observation in a [`LocalArchive`].
#[derive(Debug, Clone)]
pub struct CatalogFrame {
    pub id: String,
    /// Archive source id, e.g. `LANDSAT/LT05/C02/T1_L2`
    pub source: String,
    pub date: NaiveDate,
    /// Scene cloud cover, percent
    pub cloud_cover: f64,
    pub frame: RasterFrame,
}

/// An [`ImageryArchive`] holding its frames in memory.
///
/// Frames are laid onto the query region's grid before anything else, so
/// scenes that only partly cover the region reduce alongside full ones and
/// valid coverage is measured against the whole region. Bands whose name
/// starts with `SR_` are scaled to surface reflectance before reduction.
/// Masked queries blank pixels rejected by the QA band.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    frames: Vec<CatalogFrame>,
    qa_band: String,
    mask: QaMask,
    scale: Option<ReflectanceScale>,
}

impl Default for LocalArchive {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            qa_band: QA_PIXEL.to_string(),
            mask: QaMask::default(),
            scale: Some(ReflectanceScale::default()),
        }
    }
}

impl LocalArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames(frames: Vec<CatalogFrame>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    pub fn with_mask(mut self, mask: QaMask) -> Self {
        self.mask = mask;
        self
    }

    /// `None` keeps raw digital numbers
    pub fn with_scale(mut self, scale: Option<ReflectanceScale>) -> Self {
        self.scale = scale;
        self
    }

    pub fn push(&mut self, frame: CatalogFrame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames matching source, window, cloud cover and region, ordered by
    /// date then id so reductions are independent of insertion order.
    fn matching(&self, query: &FrameQuery) -> Vec<&CatalogFrame> {
        let mut hits: Vec<&CatalogFrame> = self
            .frames
            .iter()
            .filter(|f| query.sources.iter().any(|s| *s == f.source))
            .filter(|f| query.range.contains(f.date))
            .filter(|f| f.cloud_cover <= query.options.max_cloud_cover)
            .filter(|f| {
                f.frame.bands().first().is_some_and(|b| {
                    b.raster.bounds().intersects(&query.region.bbox)
                })
            })
            .collect();
        hits.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        hits
    }

    fn prepare(&self, frame: &CatalogFrame, query: &FrameQuery) -> Result<RasterFrame, ArchiveError> {
        let mut warped = frame.frame.warp_to(&query.region)?;
        if let Some(scale) = self.scale {
            let sr: Vec<String> = warped
                .band_names()
                .into_iter()
                .filter(|n| n.starts_with("SR_"))
                .map(str::to_string)
                .collect();
            scale.apply(&mut warped, &sr);
        }
        if query.masked {
            warped = apply_qa_mask(&warped, &self.qa_band, self.mask)?;
        }
        Ok(warped)
    }
}

impl AvailabilityArchive for LocalArchive {
    fn query_count(&self, query: &FrameQuery) -> Result<u64, ArchiveError> {
        let hits = self.matching(query);
        let count = match query.options.masked_availability {
            MaskedAvailability::ValidCoverage(min) if query.masked => {
                let mut valid = 0u64;
                for f in hits {
                    let warped = f.frame.warp_to(&query.region)?;
                    let fraction = valid_fraction(&warped, &self.qa_band, self.mask)?;
                    debug!(frame = %f.id, fraction, "valid coverage");
                    if fraction >= min {
                        valid += 1;
                    }
                }
                valid
            }
            _ => hits.len() as u64,
        };
        Ok(count)
    }
}

impl ImageryArchive for LocalArchive {
    fn median_composite(&self, query: &FrameQuery) -> Result<RasterFrame, ArchiveError> {
        let hits = self.matching(query);
        if hits.is_empty() {
            return Err(ArchiveError::InvalidQuery(format!(
                "no frames for {:?} in {}",
                query.sources, query.range
            )));
        }
        let frames = hits
            .iter()
            .map(|f| self.prepare(f, query))
            .collect::<Result<Vec<_>, _>>()?;

        let bands: Vec<&str> = frames[0]
            .band_names()
            .into_iter()
            .filter(|n| *n != self.qa_band)
            .collect();
        debug!(frames = frames.len(), ?bands, masked = query.masked, "median composite");
        Ok(median_composite(&frames, &bands)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::QueryOptions;
    use crate::period::{TimePeriod, WindowRadius};
    use approx::assert_relative_eq;
    use strata_core::{BBox, Band, GeoTransform, Raster, Region};

    fn frame(id: &str, year: i32, red: f64, qa: f64) -> CatalogFrame {
        let band = |v: f64| {
            let mut r = Raster::filled(4, 4, v);
            r.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
            r
        };
        CatalogFrame {
            id: id.into(),
            source: "S".into(),
            date: NaiveDate::from_ymd_opt(year, 6, 1).unwrap(),
            cloud_cover: 10.0,
            frame: RasterFrame::from_bands(vec![
                Band::new("SR_B3", band(red)),
                Band::new(QA_PIXEL, band(qa)),
            ])
            .unwrap(),
        }
    }

    fn query(year: i32, masked: bool) -> FrameQuery {
        FrameQuery {
            sources: vec!["S".into()],
            range: TimePeriod::new(year, WindowRadius::Exact).unwrap().range(),
            region: Region::new("r", BBox::new(0.0, 0.0, 4.0, 4.0), 1.0).unwrap(),
            masked,
            options: QueryOptions::default(),
        }
    }

    #[test]
    fn counts_by_window_and_source() {
        let mut archive = LocalArchive::new();
        archive.push(frame("a", 2005, 10_000.0, 0.0));
        archive.push(frame("b", 2006, 10_000.0, 0.0));
        assert_eq!(archive.query_count(&query(2005, true)).unwrap(), 1);
        assert_eq!(archive.query_count(&query(2007, false)).unwrap(), 0);

        let mut other = query(2005, false);
        other.sources = vec!["T".into()];
        assert_eq!(archive.query_count(&other).unwrap(), 0);
    }

    #[test]
    fn cloudy_scenes_are_filtered() {
        let mut cloudy = frame("a", 2005, 10_000.0, 0.0);
        cloudy.cloud_cover = 95.0;
        let archive = LocalArchive::with_frames(vec![cloudy]);
        assert_eq!(archive.query_count(&query(2005, false)).unwrap(), 0);
    }

    #[test]
    fn median_scales_and_masks() {
        let archive = LocalArchive::with_frames(vec![
            frame("a", 2005, 10_000.0, 0.0),
            frame("b", 2005, 20_000.0, 8.0),
        ]);
        let unmasked = archive.median_composite(&query(2005, false)).unwrap();
        assert_eq!(unmasked.band_names(), vec!["SR_B3"]);
        let expected = (0.075 + 0.35) / 2.0;
        assert_relative_eq!(unmasked.band("SR_B3").unwrap().get(0, 0).unwrap(), expected, epsilon = 1e-9);

        // Frame b is all cloud, so only a survives masking
        let masked = archive.median_composite(&query(2005, true)).unwrap();
        assert_relative_eq!(masked.band("SR_B3").unwrap().get(0, 0).unwrap(), 0.075, epsilon = 1e-9);
    }

    #[test]
    fn raw_numbers_with_cloud_only_mask() {
        // Dilated-cloud pixels pass a mask that only rejects cloud and shadow
        let frames = vec![frame("a", 2005, 10_000.0, 0.0), frame("b", 2005, 20_000.0, 2.0)];
        let archive = LocalArchive::with_frames(frames.clone())
            .with_mask(QaMask::clouds())
            .with_scale(None);
        let masked = archive.median_composite(&query(2005, true)).unwrap();
        assert_eq!(masked.band("SR_B3").unwrap().get(0, 0).unwrap(), 15_000.0);

        let strict = LocalArchive::with_frames(frames).with_scale(None);
        let masked = strict.median_composite(&query(2005, true)).unwrap();
        assert_eq!(masked.band("SR_B3").unwrap().get(0, 0).unwrap(), 10_000.0);
    }

    #[test]
    fn empty_composite_is_invalid_query() {
        let archive = LocalArchive::new();
        assert!(matches!(
            archive.median_composite(&query(2005, false)),
            Err(ArchiveError::InvalidQuery(_))
        ));
    }
}
