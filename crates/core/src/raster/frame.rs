//! Named multi-band rasters

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use crate::region::{BBox, Region};

/// One named layer of a [`RasterFrame`].
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub raster: Raster<f64>,
}

impl Band {
    pub fn new(name: impl Into<String>, raster: Raster<f64>) -> Self {
        Self {
            name: name.into(),
            raster,
        }
    }
}

/// An ordered stack of named bands sharing one grid.
///
/// This is the value archives return from a composite request and the
/// value the engine hands to callers. Band order is significant: `rename`
/// assigns names positionally, exactly like selecting and renaming bands
/// of an image in an imagery archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterFrame {
    bands: Vec<Band>,
}

impl RasterFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame, checking that every band shares the first band's grid
    pub fn from_bands(bands: Vec<Band>) -> Result<Self> {
        let mut frame = Self::new();
        for band in bands {
            frame.push(band)?;
        }
        Ok(frame)
    }

    /// A frame where every band is `value` on the given grid
    pub fn constant<S: AsRef<str>>(
        names: &[S],
        value: f64,
        rows: usize,
        cols: usize,
        transform: GeoTransform,
    ) -> Result<Self> {
        let bands = names
            .iter()
            .map(|name| {
                let mut raster = Raster::filled(rows, cols, value);
                raster.set_transform(transform);
                Band::new(name.as_ref(), raster)
            })
            .collect();
        Self::from_bands(bands)
    }

    /// Append a band. Fails on a duplicate name or a grid mismatch.
    pub fn push(&mut self, band: Band) -> Result<()> {
        if self.has_band(&band.name) {
            return Err(Error::DuplicateBand(band.name));
        }
        if let Some(first) = self.bands.first() {
            let (er, ec) = first.raster.shape();
            let (ar, ac) = band.raster.shape();
            if (er, ec) != (ar, ac) {
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }
        self.bands.push(band);
        Ok(())
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|b| b.name == name)
    }

    pub fn band(&self, name: &str) -> Option<&Raster<f64>> {
        self.bands.iter().find(|b| b.name == name).map(|b| &b.raster)
    }

    pub fn band_mut(&mut self, name: &str) -> Option<&mut Raster<f64>> {
        self.bands
            .iter_mut()
            .find(|b| b.name == name)
            .map(|b| &mut b.raster)
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Grid dimensions, `None` for a frame without bands
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.bands.first().map(|b| b.raster.shape())
    }

    pub fn transform(&self) -> Option<GeoTransform> {
        self.bands.first().map(|b| *b.raster.transform())
    }

    /// Keep only `names`, in the given order
    pub fn select_bands<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let bands = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.band(name)
                    .map(|raster| Band::new(name, raster.clone()))
                    .ok_or_else(|| Error::MissingBand(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_bands(bands)
    }

    /// Rename bands positionally
    pub fn rename<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        if names.len() != self.bands.len() {
            return Err(Error::BandCount {
                have: self.bands.len(),
                want: names.len(),
            });
        }
        let bands = self
            .bands
            .iter()
            .zip(names)
            .map(|(band, name)| Band::new(name.as_ref(), band.raster.clone()))
            .collect();
        Self::from_bands(bands)
    }

    /// Crop every band to the cells whose centers fall inside `region`
    pub fn clip(&self, region: &Region) -> Result<Self> {
        self.clip_bbox(&region.bbox)
    }

    /// Lay every band onto the region grid by nearest-cell lookup.
    ///
    /// Region cells outside this frame's footprint, or over source no-data,
    /// become NaN. Frames warped to one region always share a grid.
    pub fn warp_to(&self, region: &Region) -> Result<Self> {
        let (rows, cols) = region.shape();
        let target = region.transform();
        let bands = self
            .bands
            .iter()
            .map(|band| {
                let src = &band.raster;
                let (src_rows, src_cols) = src.shape();
                let data = Array2::from_shape_fn((rows, cols), |(row, col)| {
                    let (x, y) = target.pixel_to_geo(col, row);
                    let (c, r) = src.transform().geo_to_pixel(x, y);
                    if !(c >= 0.0 && r >= 0.0) {
                        return f64::NAN;
                    }
                    let (c, r) = (c.floor() as usize, r.floor() as usize);
                    if c >= src_cols || r >= src_rows {
                        return f64::NAN;
                    }
                    let value = src.data()[(r, c)];
                    if src.is_nodata(value) {
                        f64::NAN
                    } else {
                        value
                    }
                });
                let mut raster = Raster::from_array(data);
                raster.set_transform(target);
                Band::new(band.name.clone(), raster)
            })
            .collect();
        Self::from_bands(bands)
    }

    pub fn clip_bbox(&self, bbox: &BBox) -> Result<Self> {
        let Some(first) = self.bands.first() else {
            return Ok(Self::new());
        };
        let (rows, cols) = first.raster.shape();
        let window = first
            .raster
            .transform()
            .window_for(bbox, cols, rows)
            .ok_or(Error::RegionOutside)?;

        let bands = self
            .bands
            .iter()
            .map(|b| Ok(Band::new(b.name.clone(), b.raster.crop(window)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bands })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(names: &[&str]) -> RasterFrame {
        let bands = names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let mut r = Raster::filled(4, 4, i as f64);
                r.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
                Band::new(*n, r)
            })
            .collect();
        RasterFrame::from_bands(bands).unwrap()
    }

    #[test]
    fn select_then_rename_maps_native_to_canonical() {
        let f = frame(&["SR_B1", "SR_B2", "SR_B3", "QA_PIXEL"]);
        let out = f
            .select_bands(&["SR_B3", "SR_B2", "SR_B1"])
            .unwrap()
            .rename(&["R", "G", "B"])
            .unwrap();

        assert_eq!(out.band_names(), vec!["R", "G", "B"]);
        assert_eq!(out.band("R").unwrap().get(0, 0).unwrap(), 2.0);
        assert_eq!(out.band("B").unwrap().get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn select_missing_band_fails() {
        let f = frame(&["SR_B1"]);
        assert!(matches!(f.select_bands(&["SR_B4"]), Err(Error::MissingBand(b)) if b == "SR_B4"));
    }

    #[test]
    fn rename_requires_matching_count() {
        let f = frame(&["a", "b"]);
        assert!(matches!(f.rename(&["x"]), Err(Error::BandCount { have: 2, want: 1 })));
    }

    #[test]
    fn push_rejects_duplicates_and_mismatched_grids() {
        let mut f = frame(&["a"]);
        assert!(f.push(Band::new("a", Raster::new(4, 4))).is_err());
        assert!(f.push(Band::new("b", Raster::new(2, 2))).is_err());
        assert!(f.push(Band::new("b", Raster::new(4, 4))).is_ok());
    }

    #[test]
    fn clip_crops_all_bands() {
        let f = frame(&["a", "b"]);
        let out = f.clip_bbox(&BBox::new(1.0, 1.0, 3.0, 3.0)).unwrap();
        assert_eq!(out.shape(), Some((2, 2)));
        assert_eq!(out.band("b").unwrap().get(1, 1).unwrap(), 1.0);
    }

    #[test]
    fn clip_outside_fails() {
        let f = frame(&["a"]);
        assert!(matches!(
            f.clip_bbox(&BBox::new(10.0, 10.0, 12.0, 12.0)),
            Err(Error::RegionOutside)
        ));
    }

    #[test]
    fn warp_fills_outside_footprint_with_nan() {
        // East half of a 4x4 region, with one no-data cell
        let mut east = Raster::filled(4, 2, 7.0);
        east.set_transform(GeoTransform::new(2.0, 4.0, 1.0, -1.0));
        east.set_nodata(Some(-9999.0));
        east.set(3, 1, -9999.0).unwrap();
        let f = RasterFrame::from_bands(vec![Band::new("a", east)]).unwrap();

        let region = Region::new("r", BBox::new(0.0, 0.0, 4.0, 4.0), 1.0).unwrap();
        let out = f.warp_to(&region).unwrap();
        assert_eq!(out.shape(), Some((4, 4)));
        assert_eq!(out.transform(), Some(region.transform()));

        let a = out.band("a").unwrap();
        assert!(a.get(0, 0).unwrap().is_nan());
        assert!(a.get(2, 1).unwrap().is_nan());
        assert_eq!(a.get(0, 2).unwrap(), 7.0);
        assert_eq!(a.get(2, 3).unwrap(), 7.0);
        assert!(a.get(3, 3).unwrap().is_nan());
    }

    #[test]
    fn warp_resamples_to_region_resolution() {
        let f = frame(&["a"]);
        let region = Region::new("r", BBox::new(0.0, 0.0, 4.0, 4.0), 0.5).unwrap();
        let out = f.warp_to(&region).unwrap();
        assert_eq!(out.shape(), Some((8, 8)));
        assert_eq!(out.band("a").unwrap().get(7, 7).unwrap(), 0.0);
    }

    #[test]
    fn constant_frame_has_every_band() {
        let f = RasterFrame::constant(&["R", "G", "B"], 0.0, 3, 5, GeoTransform::default()).unwrap();
        assert_eq!(f.len(), 3);
        assert_eq!(f.shape(), Some((3, 5)));
        assert_eq!(f.band("G").unwrap().statistics().max, Some(0.0));
    }
}
