//! Raster data structures and operations

mod element;
mod frame;
mod geotransform;
mod grid;

pub use element::RasterElement;
pub use frame::{Band, RasterFrame};
pub use geotransform::{GeoTransform, PixelWindow};
pub use grid::{Raster, RasterStatistics};
