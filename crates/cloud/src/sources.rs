//! Mapping archive source ids onto STAC collections
//!
//! Archive source ids are the engine's names for one collection tier, e.g.
//! `LANDSAT/LT05/C02/T1_L2`. A STAC catalog usually serves all Landsat
//! Collection 2 Level-2 scenes from one collection, so each id becomes a
//! collection plus property filters.
//!
//! ```toml
//! [stac]
//! catalog = "pc"
//!
//! [stac.sources."LANDSAT/LT05/C02/T1_L2"]
//! collection = "landsat-c2-l2"
//! query = { platform = { eq = "landsat-5" }, "landsat:collection_category" = { eq = "T1" } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strata_engine::{FrameQuery, MaskedAvailability};

use crate::error::{CloudError, Result};
use crate::stac_client::StacCatalog;
use crate::stac_models::StacSearchParams;

/// Collection and property filters for one archive source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StacSource {
    pub collection: String,
    /// `property -> {op: value}`, STAC query extension
    #[serde(default)]
    pub query: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StacSourceMap {
    sources: BTreeMap<String, StacSource>,
}

impl StacSourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, source: StacSource) {
        self.sources.insert(id.into(), source);
    }

    pub fn get(&self, id: &str) -> Result<&StacSource> {
        self.sources
            .get(id)
            .ok_or_else(|| CloudError::UnknownSource(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Landsat Collection 2 Level-2 on Planetary Computer (`landsat-c2-l2`).
    pub fn landsat_c2() -> Self {
        let mut map = Self::new();
        for (mission, platform) in [
            ("LT05", "landsat-5"),
            ("LE07", "landsat-7"),
            ("LC08", "landsat-8"),
            ("LC09", "landsat-9"),
        ] {
            for category in ["T1", "T2"] {
                let mut query = Map::new();
                query.insert("platform".into(), json!({ "eq": platform }));
                query.insert(
                    "landsat:collection_category".into(),
                    json!({ "eq": category }),
                );
                map.insert(
                    format!("LANDSAT/{mission}/C02/{category}_L2"),
                    StacSource {
                        collection: "landsat-c2-l2".into(),
                        query,
                    },
                );
            }
        }
        map
    }

    /// Search body counting frames of `source` for `query`.
    ///
    /// Masked queries under valid-coverage availability tighten the scene
    /// cloud filter to `(1 - min_fraction) * 100`: scene cloud cover is the
    /// closest thing to masked coverage a catalog can filter on.
    pub fn search_params(&self, source: &str, query: &FrameQuery) -> Result<StacSearchParams> {
        let mapped = self.get(source)?;
        let mut max_cloud = query.options.max_cloud_cover;
        if let (true, MaskedAvailability::ValidCoverage(min)) =
            (query.masked, query.options.masked_availability)
        {
            max_cloud = max_cloud.min((1.0 - min) * 100.0);
        }

        let datetime = format!(
            "{}T00:00:00Z/{}T23:59:59Z",
            query.range.start, query.range.end
        );
        let mut params = StacSearchParams::new()
            .bbox(&query.region.bbox)
            .datetime(&datetime)
            .collections(&[mapped.collection.as_str()]);
        for (property, ops) in &mapped.query {
            if let Some(ops) = ops.as_object() {
                for (op, value) in ops {
                    params = params.filter(property, op, value.clone());
                }
            }
        }
        Ok(params.filter("eo:cloud_cover", "lte", json!(max_cloud)))
    }
}

fn default_cache_capacity() -> usize {
    256
}

/// The `[stac]` table of a strata configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StacConfig {
    #[serde(default = "StacConfig::default_catalog")]
    pub catalog: StacCatalog,
    /// Overrides and additions on top of [`StacSourceMap::landsat_c2`]
    #[serde(default)]
    pub sources: StacSourceMap,
    /// Cached probe counts
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for StacConfig {
    fn default() -> Self {
        Self {
            catalog: Self::default_catalog(),
            sources: StacSourceMap::landsat_c2(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    stac: Option<StacConfig>,
}

impl StacConfig {
    fn default_catalog() -> StacCatalog {
        StacCatalog::PlanetaryComputer
    }

    /// Read `[stac]` from a strata TOML file; other tables are ignored.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| CloudError::Config(e.to_string()))?;
        let Some(mut config) = file.stac else {
            return Ok(Self::default());
        };
        let mut sources = StacSourceMap::landsat_c2();
        sources.sources.append(&mut config.sources.sources);
        config.sources = sources;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| CloudError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
