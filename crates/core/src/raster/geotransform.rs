//! Affine geotransformation for north-up rasters

use serde::{Deserialize, Serialize};

use crate::region::BBox;

/// Affine coefficients for a north-up raster.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is negative for the usual top-down row order. Archive
/// frames are delivered already resampled onto a north-up grid, so rotation
/// terms are not carried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X
    pub pixel_width: f64,
    /// Cell size in Y, usually negative
    pub pixel_height: f64,
}

/// A rectangular block of cells inside a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub col_off: usize,
    pub row_off: usize,
    pub cols: usize,
    pub rows: usize,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Geographic coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Geographic coordinates of the pixel's top-left corner
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + col as f64 * self.pixel_width,
            self.origin_y + row as f64 * self.pixel_height,
        )
    }

    /// Fractional (col, row) for a geographic point
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        if self.pixel_width.abs() < 1e-12 || self.pixel_height.abs() < 1e-12 {
            return (f64::NAN, f64::NAN);
        }
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Extent of a `cols` x `rows` raster on this transform
    pub fn bounds(&self, cols: usize, rows: usize) -> BBox {
        let (x0, y0) = self.pixel_to_geo_corner(0, 0);
        let (x1, y1) = self.pixel_to_geo_corner(cols, rows);
        BBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Cells of a `cols` x `rows` raster whose centers fall inside `bbox`.
    ///
    /// Returns `None` when no cell center is covered.
    pub fn window_for(&self, bbox: &BBox, cols: usize, rows: usize) -> Option<PixelWindow> {
        let (c0, r0) = self.geo_to_pixel(bbox.min_x, bbox.max_y);
        let (c1, r1) = self.geo_to_pixel(bbox.max_x, bbox.min_y);
        if !(c0.is_finite() && r0.is_finite() && c1.is_finite() && r1.is_finite()) {
            return None;
        }

        // A cell center at (i + 0.5) lies in [lo, hi) when i in [ceil(lo - 0.5), ceil(hi - 0.5)).
        let span = |a: f64, b: f64, limit: usize| -> (usize, usize) {
            let (lo, hi) = (a.min(b), a.max(b));
            let start = (lo - 0.5).ceil().max(0.0) as usize;
            let end = ((hi - 0.5).ceil().max(0.0) as usize).min(limit);
            (start.min(limit), end)
        };

        let (col_start, col_end) = span(c0, c1, cols);
        let (row_start, row_end) = span(r0, r1, rows);
        if col_end <= col_start || row_end <= row_start {
            return None;
        }

        Some(PixelWindow {
            col_off: col_start,
            row_off: row_start,
            cols: col_end - col_start,
            rows: row_end - row_start,
        })
    }

    /// Transform of a sub-window starting at (`col_off`, `row_off`)
    pub fn offset(&self, col_off: usize, row_off: usize) -> Self {
        let (x, y) = self.pixel_to_geo_corner(col_off, row_off);
        Self::new(x, y, self.pixel_width, self.pixel_height)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
