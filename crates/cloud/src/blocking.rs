//! Synchronous access for callers without an async runtime.
//!
//! [`StacClientBlocking`] owns a current-thread Tokio runtime and drives the
//! async [`StacClient`] on it. Calling it from inside another Tokio runtime
//! panics, as with any nested `block_on`.

use tokio::runtime::{Builder, Runtime};

use crate::error::{CloudError, Result};
use crate::stac_client::{StacCatalog, StacClient, StacClientOptions};
use crate::stac_models::{StacItem, StacItemCollection, StacSearchParams};

/// [`StacClient`] with blocking methods.
pub struct StacClientBlocking {
    runtime: Runtime,
    client: StacClient,
}

impl StacClientBlocking {
    pub fn new(catalog: StacCatalog, options: StacClientOptions) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CloudError::Network(format!("starting runtime: {e}")))?;
        let client = StacClient::new(catalog, options)?;
        Ok(Self { runtime, client })
    }

    pub fn catalog(&self) -> &StacCatalog {
        self.client.catalog()
    }

    /// See [`StacClient::search`].
    pub fn search(&self, params: &StacSearchParams) -> Result<StacItemCollection> {
        self.runtime.block_on(self.client.search(params))
    }

    /// See [`StacClient::search_all`].
    pub fn search_all(&self, params: &StacSearchParams) -> Result<Vec<StacItem>> {
        self.runtime.block_on(self.client.search_all(params))
    }

    /// See [`StacClient::count`].
    pub fn count(&self, params: &StacSearchParams) -> Result<u64> {
        self.runtime.block_on(self.client.count(params))
    }
}
