//! STAC (SpatioTemporal Asset Catalog) data types.
//!
//! Serde models for STAC Item Search (POST /search): the request body with
//! the `query` extension used for property filters, and the response
//! fields needed to count matches and page through results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strata_core::BBox;

// ---------------------------------------------------------------------------
// Search request
// ---------------------------------------------------------------------------

/// Body for `POST /search` (STAC API – Item Search).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StacSearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,

    /// Property filters, STAC query extension:
    /// `{"eo:cloud_cover": {"lte": 90}}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Pagination token (next page).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl StacSearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bounding box `[west, south, east, north]`.
    pub fn bbox(mut self, bbox: &BBox) -> Self {
        self.bbox = Some(bbox.to_array().to_vec());
        self
    }

    /// Set datetime or datetime range (e.g. `"2024-06-01/2024-06-30"`).
    pub fn datetime(mut self, dt: &str) -> Self {
        self.datetime = Some(dt.to_string());
        self
    }

    pub fn collections(mut self, cols: &[&str]) -> Self {
        self.collections = Some(cols.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Add one `property: {op: value}` filter. Repeated calls on the same
    /// property accumulate operators.
    pub fn filter(mut self, property: &str, op: &str, value: Value) -> Self {
        let query = self.query.get_or_insert_with(Map::new);
        let entry = query
            .entry(property.to_string())
            .or_insert_with(|| json!({}));
        if let Some(ops) = entry.as_object_mut() {
            ops.insert(op.to_string(), value);
        }
        self
    }

    /// Set maximum items per page.
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set pagination token.
    pub fn token(mut self, tok: &str) -> Self {
        self.token = Some(tok.to_string());
        self
    }

    /// Stable key for caching: the serialized body without paging fields.
    pub fn cache_key(&self) -> String {
        let unpaged = Self {
            limit: None,
            token: None,
            ..self.clone()
        };
        serde_json::to_string(&unpaged).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A STAC Item Collection (GeoJSON FeatureCollection).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItemCollection {
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<StacItem>,

    #[serde(default)]
    pub links: Vec<StacLink>,

    #[serde(rename = "numberMatched", skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<u64>,

    #[serde(rename = "numberReturned", skip_serializing_if = "Option::is_none")]
    pub number_returned: Option<u64>,

    /// Older catalogs report counts under the context extension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StacItemCollection {
    /// Total matches reported by the server, from `numberMatched` or
    /// `context.matched`.
    pub fn matched(&self) -> Option<u64> {
        self.number_matched.or_else(|| {
            self.context
                .as_ref()
                .and_then(|c| c.get("matched"))
                .and_then(Value::as_u64)
        })
    }

    /// Find the `"next"` pagination link, if any.
    pub fn next_link(&self) -> Option<&StacLink> {
        self.links.iter().find(|l| l.rel == "next")
    }

    pub fn has_next(&self) -> bool {
        self.next_link().is_some()
    }

    /// Number of items in this page.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A single STAC Item (GeoJSON Feature). Geometry and assets are kept raw;
/// probing never reads pixels.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItem {
    #[serde(rename = "type")]
    pub type_: String,

    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    pub properties: StacItemProperties,

    #[serde(default)]
    pub assets: HashMap<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

/// STAC Item properties.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItemProperties {
    /// ISO 8601 datetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Scene cloud cover percentage (EO extension).
    #[serde(rename = "eo:cloud_cover", skip_serializing_if = "Option::is_none")]
    pub eo_cloud_cover: Option<f64>,

    /// Platform name (e.g., "landsat-5").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A STAC Link (used for pagination).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacLink {
    /// Relationship: `"self"`, `"root"`, `"next"`, `"prev"`, etc.
    pub rel: String,

    pub href: String,

    /// HTTP method for the link (default GET, but `"next"` often uses POST).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Request body for POST-based pagination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// If true, merge body with the previous request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
