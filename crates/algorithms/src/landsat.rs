//! Landsat Collection-2 Level-2 pixel handling
//!
//! QA_PIXEL bit masking and surface-reflectance scaling. These belong to the
//! imagery archive, not to composite selection: an archive applies them when
//! a request asks for the masked variant of a window.

use serde::{Deserialize, Serialize};
use strata_core::raster::{Band, RasterFrame};
use strata_core::{Error, Result};

/// Name of the Collection-2 pixel quality band
pub const QA_PIXEL: &str = "QA_PIXEL";

/// Set of QA_PIXEL bits that reject a pixel when any is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaMask {
    pub bits: u16,
}

impl QaMask {
    pub const FILL: u16 = 1 << 0;
    pub const DILATED_CLOUD: u16 = 1 << 1;
    pub const CIRRUS: u16 = 1 << 2;
    pub const CLOUD: u16 = 1 << 3;
    pub const CLOUD_SHADOW: u16 = 1 << 4;
    pub const SNOW: u16 = 1 << 5;

    /// Cloud and cloud shadow only
    pub fn clouds() -> Self {
        Self {
            bits: Self::CLOUD | Self::CLOUD_SHADOW,
        }
    }

    /// Whether a QA value passes the mask
    pub fn keeps(&self, qa: f64) -> bool {
        if !qa.is_finite() || qa < 0.0 {
            return false;
        }
        (qa as u32 as u16) & self.bits == 0
    }
}

impl Default for QaMask {
    /// Fill, dilated cloud, cirrus, cloud, shadow and snow (bits 0..=5)
    fn default() -> Self {
        Self {
            bits: Self::FILL
                | Self::DILATED_CLOUD
                | Self::CIRRUS
                | Self::CLOUD
                | Self::CLOUD_SHADOW
                | Self::SNOW,
        }
    }
}

/// Set rejected pixels to NaN in every band except the QA band itself.
pub fn apply_qa_mask(frame: &RasterFrame, qa_band: &str, mask: QaMask) -> Result<RasterFrame> {
    let qa = frame
        .band(qa_band)
        .ok_or_else(|| Error::MissingBand(qa_band.to_string()))?;

    let bands = frame
        .bands()
        .iter()
        .map(|band| {
            if band.name == qa_band {
                return band.clone();
            }
            let mut raster = band.raster.clone();
            raster.data_mut().zip_mut_with(qa.data(), |v, &q| {
                if !mask.keeps(q) {
                    *v = f64::NAN;
                }
            });
            Band::new(band.name.clone(), raster)
        })
        .collect();
    RasterFrame::from_bands(bands)
}

/// Fraction of pixels whose QA value passes `mask`, in `[0, 1]`.
///
/// An empty QA band has no valid coverage.
pub fn valid_fraction(frame: &RasterFrame, qa_band: &str, mask: QaMask) -> Result<f64> {
    let qa = frame
        .band(qa_band)
        .ok_or_else(|| Error::MissingBand(qa_band.to_string()))?;
    if qa.is_empty() {
        return Ok(0.0);
    }
    let kept = qa.data().iter().filter(|&&q| mask.keeps(q)).count();
    Ok(kept as f64 / qa.len() as f64)
}

/// Linear DN → reflectance scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReflectanceScale {
    pub gain: f64,
    pub offset: f64,
}

impl Default for ReflectanceScale {
    /// Collection-2 Level-2 surface reflectance
    fn default() -> Self {
        Self {
            gain: 0.000_027_5,
            offset: -0.2,
        }
    }
}

impl ReflectanceScale {
    /// Scale the named bands in place; other bands are left untouched.
    /// Names absent from the frame are ignored.
    pub fn apply<S: AsRef<str>>(&self, frame: &mut RasterFrame, bands: &[S]) {
        for name in bands {
            if let Some(raster) = frame.band_mut(name.as_ref()) {
                let nodata = raster.nodata();
                raster.data_mut().mapv_inplace(|v| {
                    if v.is_nan() || nodata == Some(v) {
                        f64::NAN
                    } else {
                        v * self.gain + self.offset
                    }
                });
                raster.set_nodata(Some(f64::NAN));
            }
        }
    }
}
