//! # Strata Core
//!
//! Data model shared by the strata crates.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2D grid
//! - `GeoTransform`: affine pixel/geographic mapping
//! - `RasterFrame`: a stack of named bands on one grid, the unit that
//!   archives hand back and composites are made of
//! - `BBox` / `Region`: the target area a composite is clipped to
//! - Native GeoTIFF reading for local frame archives

pub mod error;
pub mod io;
pub mod raster;
pub mod region;

pub use error::{Error, Result};
pub use raster::{Band, GeoTransform, PixelWindow, Raster, RasterElement, RasterFrame};
pub use region::{BBox, Region};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Band, GeoTransform, Raster, RasterElement, RasterFrame};
    pub use crate::region::{BBox, Region};
}
