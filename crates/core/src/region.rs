//! Target areas for composites

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::GeoTransform;

/// A geographic bounding box `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Finite and strictly positive in both directions
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    /// Check if two bboxes overlap with non-zero area.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// `[west, south, east, north]`, the order STAC search expects
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

impl FromStr for BBox {
    type Err = Error;

    /// Parse `"west,south,east,north"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidParameter {
                name: "bbox",
                value: s.to_string(),
                reason: e.to_string(),
            })?;
        let bbox = match parts.as_slice() {
            [w, south, e, n] => BBox::new(*w, *south, *e, *n),
            _ => {
                return Err(Error::InvalidParameter {
                    name: "bbox",
                    value: s.to_string(),
                    reason: format!("expected 4 comma-separated numbers, got {}", parts.len()),
                })
            }
        };
        if !bbox.is_valid() {
            return Err(Error::InvalidParameter {
                name: "bbox",
                value: s.to_string(),
                reason: "west < east and south < north required".into(),
            });
        }
        Ok(bbox)
    }
}

/// The area a composite is built for, with the output cell size.
///
/// The region fixes the grid a placeholder composite is laid out on, so a
/// result always has a concrete extent even when no frame was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub bbox: BBox,
    /// Output cell size in bbox units
    pub resolution: f64,
}

impl Region {
    pub fn new(name: impl Into<String>, bbox: BBox, resolution: f64) -> Result<Self> {
        if !bbox.is_valid() {
            return Err(Error::InvalidParameter {
                name: "bbox",
                value: bbox.to_string(),
                reason: "degenerate or non-finite extent".into(),
            });
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(Error::InvalidParameter {
                name: "resolution",
                value: resolution.to_string(),
                reason: "must be positive".into(),
            });
        }
        Ok(Self {
            name: name.into(),
            bbox,
            resolution,
        })
    }

    /// Grid dimensions as (rows, cols), at least one cell each way
    pub fn shape(&self) -> (usize, usize) {
        let rows = (self.bbox.height() / self.resolution).ceil().max(1.0) as usize;
        let cols = (self.bbox.width() / self.resolution).ceil().max(1.0) as usize;
        (rows, cols)
    }

    /// North-up transform anchored at the bbox's upper-left corner
    pub fn transform(&self) -> GeoTransform {
        GeoTransform::new(
            self.bbox.min_x,
            self.bbox.max_y,
            self.resolution,
            -self.resolution,
        )
    }
}
