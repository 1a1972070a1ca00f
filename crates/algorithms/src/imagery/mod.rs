//! Spectral indices over composite bands
//!
//! - Normalized difference: generic two-band index
//! - NDVI, EVI: the vegetation indices derived from resolved composites

mod indices;

pub use indices::{evi, ndvi, normalized_difference, EviParams, SpectralIndex};
