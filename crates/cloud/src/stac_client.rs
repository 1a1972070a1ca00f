//! Async STAC Item Search client.
//!
//! Planetary Computer and Earth Search are known by shorthand; any other
//! STAC API root works through [`StacCatalog::Custom`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CloudError, Result};
use crate::stac_models::{StacItem, StacItemCollection, StacLink, StacSearchParams};

/// Longest slice of an error body kept in messages
const ERROR_BODY_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A STAC API to search.
///
/// Serialized as its shorthand (`"pc"`, `"es"`) or the custom URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StacCatalog {
    /// Microsoft Planetary Computer
    PlanetaryComputer,
    /// Element 84 Earth Search on AWS
    EarthSearch,
    /// API root or search URL of any other catalog
    Custom(String),
}

impl StacCatalog {
    /// The `POST /search` endpoint.
    pub fn search_url(&self) -> String {
        match self {
            Self::PlanetaryComputer => {
                "https://planetarycomputer.microsoft.com/api/stac/v1/search".to_string()
            }
            Self::EarthSearch => "https://earth-search.aws.element84.com/v1/search".to_string(),
            Self::Custom(root) => {
                let root = root.trim_end_matches('/');
                match root.ends_with("/search") {
                    true => root.to_string(),
                    false => format!("{root}/search"),
                }
            }
        }
    }

    /// `"pc"` / `"planetary-computer"` and `"es"` / `"earth-search"`, case
    /// insensitive. Anything else is kept verbatim as a custom URL.
    pub fn from_str_or_url(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "pc" | "planetary-computer" | "planetarycomputer" => Self::PlanetaryComputer,
            "es" | "earth-search" | "earthsearch" => Self::EarthSearch,
            _ => Self::Custom(s.to_string()),
        }
    }
}

impl From<String> for StacCatalog {
    fn from(s: String) -> Self {
        Self::from_str_or_url(&s)
    }
}

impl From<StacCatalog> for String {
    fn from(catalog: StacCatalog) -> String {
        match catalog {
            StacCatalog::PlanetaryComputer => "pc".into(),
            StacCatalog::EarthSearch => "es".into(),
            StacCatalog::Custom(url) => url,
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Transport limits for [`StacClient`].
#[derive(Debug, Clone)]
pub struct StacClientOptions {
    /// Per request, default 30 s
    pub request_timeout: Duration,
    /// Extra attempts after a transient failure, default 3
    pub max_retries: u32,
    /// Cap on items collected by [`StacClient::search_all`], default 500
    pub max_items: usize,
}

impl Default for StacClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            max_items: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Outcome of a single HTTP exchange
enum Exchange {
    Page(StacItemCollection),
    /// Server or transport failure worth another attempt
    Transient(CloudError),
    /// 4xx or unparseable body
    Fatal(CloudError),
}

/// Async client for one catalog's Item Search endpoint.
pub struct StacClient {
    catalog: StacCatalog,
    http: reqwest::Client,
    options: StacClientOptions,
}

impl StacClient {
    pub fn new(catalog: StacCatalog, options: StacClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| CloudError::Network(format!("building HTTP client: {e}")))?;

        Ok(Self {
            catalog,
            http,
            options,
        })
    }

    pub fn catalog(&self) -> &StacCatalog {
        &self.catalog
    }

    /// One page of results for `params`.
    pub async fn search(&self, params: &StacSearchParams) -> Result<StacItemCollection> {
        self.post_with_retry(&self.catalog.search_url(), params).await
    }

    /// Number of items matching `params`.
    ///
    /// Requests a single item and reads the server's match count. For
    /// catalogs that report none the result pages are walked instead, which
    /// stops at `max_items` and is then a lower bound.
    pub async fn count(&self, params: &StacSearchParams) -> Result<u64> {
        let first = self.search(&params.clone().limit(1)).await?;
        match first.matched() {
            Some(matched) => Ok(matched),
            None if first.is_empty() => Ok(0),
            None => {
                warn!(
                    catalog = %self.catalog.search_url(),
                    cap = self.options.max_items,
                    "no match count in response, paging through items"
                );
                Ok(self.search_all(params).await?.len() as u64)
            }
        }
    }

    /// Every item for `params` across pages, capped at `max_items`.
    pub async fn search_all(&self, params: &StacSearchParams) -> Result<Vec<StacItem>> {
        let cap = self.options.max_items;
        let mut items = Vec::new();
        let mut page = self.search(params).await?;

        loop {
            let next = page.next_link().cloned();
            items.append(&mut page.features);
            let Some(link) = next.filter(|_| items.len() < cap) else {
                break;
            };
            page = self.next_page(&link, params).await?;
            if page.is_empty() {
                break;
            }
        }

        items.truncate(cap);
        Ok(items)
    }

    async fn post_with_retry(
        &self,
        url: &str,
        params: &StacSearchParams,
    ) -> Result<StacItemCollection> {
        let mut attempt = 0;
        loop {
            let error = match self.post_once(url, params).await {
                Exchange::Page(page) => return Ok(page),
                Exchange::Fatal(e) => return Err(e),
                Exchange::Transient(e) => e,
            };
            if attempt >= self.options.max_retries {
                return Err(error);
            }
            attempt += 1;
            // 500 ms doubling per attempt
            let delay = Duration::from_millis(500 << (attempt - 1));
            debug!(attempt, ?delay, error = %error, "retrying STAC search");
            tokio::time::sleep(delay).await;
        }
    }

    async fn post_once(&self, url: &str, params: &StacSearchParams) -> Exchange {
        let response = match self.http.post(url).json(params).send().await {
            Ok(response) => response,
            Err(e) => return Exchange::Transient(CloudError::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let error = http_status_error("search", status, response).await;
            return match status.is_client_error() {
                true => Exchange::Fatal(error),
                false => Exchange::Transient(error),
            };
        }

        match read_page(response).await {
            Ok(page) => Exchange::Page(page),
            Err(e @ CloudError::Http(_)) => Exchange::Transient(e),
            Err(e) => Exchange::Fatal(e),
        }
    }

    /// Follow a `next` link: POST links carry a body (merged into the
    /// initial search when `merge` is set), anything else is a GET.
    async fn next_page(
        &self,
        link: &StacLink,
        params: &StacSearchParams,
    ) -> Result<StacItemCollection> {
        let is_post = link
            .method
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("POST"));

        if is_post {
            let body = next_body(link, params)?;
            return self.post_with_retry(&link.href, &body).await;
        }

        let response = self.http.get(&link.href).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(http_status_error("pagination", status, response).await);
        }
        read_page(response).await
    }
}

/// Search body for a POST `next` link.
fn next_body(link: &StacLink, params: &StacSearchParams) -> Result<StacSearchParams> {
    let Some(overlay) = &link.body else {
        return Ok(params.clone());
    };
    let mut body = match link.merge.unwrap_or(false) {
        true => serde_json::to_value(params)
            .map_err(|e| CloudError::Network(format!("encoding search body: {e}")))?,
        false => serde_json::Value::Object(Default::default()),
    };
    if let (Some(base), Some(overlay)) = (body.as_object_mut(), overlay.as_object()) {
        base.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    serde_json::from_value(body)
        .map_err(|e| CloudError::Network(format!("decoding next-page body: {e}")))
}

async fn read_page(response: reqwest::Response) -> Result<StacItemCollection> {
    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| CloudError::Network(format!("decoding STAC response: {e}")))
}

async fn http_status_error(
    what: &str,
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> CloudError {
    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(ERROR_BODY_CHARS)
        .collect();
    CloudError::Network(format!("STAC {what} returned HTTP {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn known_catalogs_have_fixed_endpoints() {
        assert_eq!(
            StacCatalog::PlanetaryComputer.search_url(),
            "https://planetarycomputer.microsoft.com/api/stac/v1/search"
        );
        assert_eq!(
            StacCatalog::EarthSearch.search_url(),
            "https://earth-search.aws.element84.com/v1/search"
        );
    }

    #[test]
    fn custom_roots_gain_one_search_segment() {
        for root in [
            "https://stac.test/api",
            "https://stac.test/api/",
            "https://stac.test/api/search",
        ] {
            assert_eq!(
                StacCatalog::Custom(root.into()).search_url(),
                "https://stac.test/api/search"
            );
        }
    }

    #[test]
    fn shorthands_are_case_insensitive_and_urls_kept() {
        assert_eq!(StacCatalog::from_str_or_url("PC"), StacCatalog::PlanetaryComputer);
        assert_eq!(StacCatalog::from_str_or_url("earth-search"), StacCatalog::EarthSearch);
        assert_eq!(
            StacCatalog::from_str_or_url("https://My-Stac.test"),
            StacCatalog::Custom("https://My-Stac.test".into())
        );
        let s: String = StacCatalog::EarthSearch.into();
        assert_eq!(s, "es");
    }

    fn link(body: Option<serde_json::Value>, merge: Option<bool>) -> StacLink {
        serde_json::from_value(json!({
            "rel": "next",
            "href": "https://stac.test/search",
            "method": "POST",
            "body": body,
            "merge": merge,
        }))
        .unwrap()
    }

    #[test]
    fn merged_next_body_keeps_original_filters() {
        let params = StacSearchParams::new()
            .collections(&["landsat-c2-l2"])
            .limit(1);
        let body = next_body(&link(Some(json!({ "token": "next:abc" })), Some(true)), &params)
            .unwrap();
        assert_eq!(body.collections, Some(vec!["landsat-c2-l2".to_string()]));
        assert_eq!(body.token.as_deref(), Some("next:abc"));
    }

    #[test]
    fn unmerged_next_body_replaces_search() {
        let params = StacSearchParams::new().collections(&["landsat-c2-l2"]);
        let body = next_body(&link(Some(json!({ "token": "t2" })), None), &params).unwrap();
        assert_eq!(body.collections, None);
        assert_eq!(body.token.as_deref(), Some("t2"));
    }
}
