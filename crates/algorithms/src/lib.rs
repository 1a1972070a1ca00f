//! # Strata Algorithms
//!
//! Pixel-level operations used to build and interpret composites:
//!
//! - **reduce**: per-pixel median across a stack of frames
//! - **landsat**: Collection-2 QA_PIXEL masking, surface-reflectance scaling
//!   and valid-coverage measurement
//! - **imagery**: NDVI / EVI from composite bands

pub mod imagery;
pub mod landsat;
pub mod reduce;

pub use imagery::{evi, ndvi, normalized_difference, EviParams, SpectralIndex};
pub use landsat::{apply_qa_mask, valid_fraction, QaMask, ReflectanceScale};
pub use reduce::median_composite;
