//! Vegetation indices
//!
//! Inputs are single-band rasters on one grid, typically the canonical
//! bands of a composite. Any NaN input yields NaN output.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use rayon::prelude::*;
use strata_core::raster::Raster;
use strata_core::{Error, Result};

/// Supported indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralIndex {
    /// Normalized Difference Vegetation Index
    Ndvi,
    /// Enhanced Vegetation Index
    Evi,
}

impl SpectralIndex {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ndvi => "NDVI",
            Self::Evi => "EVI",
        }
    }
}

impl fmt::Display for SpectralIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpectralIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ndvi" => Ok(Self::Ndvi),
            "evi" => Ok(Self::Evi),
            other => Err(Error::InvalidParameter {
                name: "index",
                value: other.to_string(),
                reason: "expected ndvi or evi".into(),
            }),
        }
    }
}

/// `(a - b) / (a + b)`, NaN where the sum vanishes.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;
    per_pixel(band_a, |row, col| {
        let a = band_a.data()[(row, col)];
        let b = band_b.data()[(row, col)];
        if band_a.is_nodata(a) || band_b.is_nodata(b) {
            return f64::NAN;
        }
        let sum = a + b;
        if sum.abs() < 1e-10 {
            f64::NAN
        } else {
            (a - b) / sum
        }
    })
}

/// `NDVI = (NIR - Red) / (NIR + Red)`
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

/// EVI coefficients
#[derive(Debug, Clone, Copy)]
pub struct EviParams {
    /// Gain factor (default: 2.5)
    pub g: f64,
    /// Aerosol coefficient for red band (default: 6.0)
    pub c1: f64,
    /// Aerosol coefficient for blue band (default: 7.5)
    pub c2: f64,
    /// Canopy background adjustment (default: 1.0)
    pub l: f64,
}

impl Default for EviParams {
    fn default() -> Self {
        Self {
            g: 2.5,
            c1: 6.0,
            c2: 7.5,
            l: 1.0,
        }
    }
}

/// Enhanced Vegetation Index
///
/// `EVI = G * (NIR - Red) / (NIR + C1 * Red - C2 * Blue + L)`
pub fn evi(
    nir: &Raster<f64>,
    red: &Raster<f64>,
    blue: &Raster<f64>,
    params: EviParams,
) -> Result<Raster<f64>> {
    check_dimensions(nir, red)?;
    check_dimensions(nir, blue)?;
    per_pixel(nir, |row, col| {
        let n = nir.data()[(row, col)];
        let r = red.data()[(row, col)];
        let b = blue.data()[(row, col)];
        if nir.is_nodata(n) || red.is_nodata(r) || blue.is_nodata(b) {
            return f64::NAN;
        }
        let denom = n + params.c1 * r - params.c2 * b + params.l;
        if denom.abs() < 1e-10 {
            f64::NAN
        } else {
            params.g * (n - r) / denom
        }
    })
}

fn per_pixel<F>(template: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    let (rows, cols) = template.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| (0..cols).map(|col| f(row, col)).collect::<Vec<_>>())
        .collect();

    let array =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mut output = template.with_data(array)?;
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}
