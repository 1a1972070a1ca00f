//! # Strata Engine
//!
//! Resolves "what composite represents year Y for product P over region R,
//! and did it actually succeed" against an imagery archive.
//!
//! Two cascades are nested:
//!
//! - **outer** ([`CompositeEngine`]): the [`SensorPolicy`] entry for the
//!   year lists preferred families, then an optional merged fallback group
//! - **inner** ([`CascadeResolver`]): per family, tiers T0..T5 widen the
//!   time window and drop masking until some tier has frames; T6 is a
//!   zero-valued placeholder
//!
//! Every result carries [`Provenance`] naming the tier that built it.
//!
//! ```no_run
//! use strata_core::{BBox, Region};
//! use strata_engine::{CompositeEngine, EngineConfig, LocalArchive, Product};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::builtin();
//! let archive = LocalArchive::from_manifest("frames.toml")?;
//! let region = Region::new("site", BBox::new(-74.2, 4.5, -74.0, 4.7), 0.00025)?;
//!
//! let engine = CompositeEngine::new(&config, &archive);
//! let result = engine.resolve(2005, Product::TrueColor, &region)?;
//! println!("{} {}", result.provenance.family, result.provenance.tier);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod candidate;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod period;
pub mod policy;
pub mod prober;
pub mod registry;
pub mod result;
pub mod validator;

pub use archive::{
    AvailabilityArchive, CatalogFrame, FrameManifest, FrameQuery, ImageryArchive, LocalArchive,
    MaskedAvailability, QueryOptions,
};
pub use candidate::{Candidate, Tier};
pub use cascade::{CascadeOutcome, CascadeResolver, TierProbe, TierSelection};
pub use config::EngineConfig;
pub use engine::{CompositeEngine, PlanReport};
pub use error::{ArchiveError, EngineError, Result};
pub use period::{DateRange, TimePeriod, WindowRadius};
pub use policy::{FallbackGroup, PolicyEntry, SensorPolicy};
pub use prober::AvailabilityProber;
pub use registry::{BandMap, BandSpec, CanonicalRole, Product, SourceFamily, SourceRegistry};
pub use result::{CompositeResult, FamilyAttempt, Provenance, NO_FAMILY};
pub use validator::{BandValidator, RejectedTier, Validated};
