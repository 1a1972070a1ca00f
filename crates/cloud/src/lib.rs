//! # Strata Cloud
//!
//! Availability probing against STAC (SpatioTemporal Asset Catalog) APIs.
//!
//! [`StacProber`] implements the engine's
//! [`AvailabilityArchive`](strata_engine::AvailabilityArchive) by counting
//! matching items through STAC Item Search, without fetching any pixels.
//! That is enough to run [`CompositeEngine::plan`](strata_engine::CompositeEngine::plan)
//! against a live catalog and see which family and tier a year would
//! resolve to.
//!
//! - [`StacClient`]: async Item Search with pagination and retries
//! - [`blocking::StacClientBlocking`]: the same on a private Tokio runtime
//! - [`StacSourceMap`]: archive source ids to STAC collections and filters
//! - [`CountCache`]: LRU cache of counts per search body

pub mod blocking;
pub mod cache;
pub mod error;
pub mod prober;
pub mod sources;
pub mod stac_client;
pub mod stac_models;

pub use cache::CountCache;
pub use error::{CloudError, Result};
pub use prober::StacProber;
pub use sources::{StacConfig, StacSource, StacSourceMap};
pub use stac_client::{StacCatalog, StacClient, StacClientOptions};
pub use stac_models::{StacItem, StacItemCollection, StacSearchParams};
