// src/app/catalog.rs
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use super::error::CatalogError;
use super::types::{CatalogItem, Collection, MediaKind, RawPage};
use crate::config::AppConfig;

const REQUEST_TIMEOUT_SECS: u64 = 20;

/// One decoded page of a list or search endpoint.
#[derive(Debug, Default)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    /// Reported page count; absent on endpoints that do not page.
    pub total_pages: Option<u32>,
}

/// Anything that can serve catalog pages. The HTTP client is the real one;
/// tests plug in canned pages.
pub trait CatalogSource: Send + Sync {
    /// `path` is an API path such as `/movie/popular`; `query` is the raw search text.
    fn fetch_page(
        &self,
        kind: MediaKind,
        path: &str,
        page: u32,
        query: Option<&str>,
    ) -> Result<CatalogPage, CatalogError>;
}

pub struct TmdbClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl TmdbClient {
    pub fn new(cfg: &AppConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent("flix/catalog")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CatalogError::Network {
                endpoint: cfg.api_base_url.clone(),
                message: format!("http client: {e}"),
            })?;
        Ok(Self {
            client,
            api_key: cfg.tmdb_api_key.clone(),
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn page_url(&self, api_key: &str, path: &str, page: u32, query: Option<&str>) -> String {
        let mut url = format!(
            "{}{}?api_key={}&page={}",
            self.base_url,
            path,
            urlencoding::encode(api_key),
            page
        );
        if let Some(q) = query {
            url.push_str("&query=");
            url.push_str(&urlencoding::encode(q));
        }
        url
    }
}

impl CatalogSource for TmdbClient {
    fn fetch_page(
        &self,
        kind: MediaKind,
        path: &str,
        page: u32,
        query: Option<&str>,
    ) -> Result<CatalogPage, CatalogError> {
        let api_key = self.api_key.as_deref().ok_or(CatalogError::MissingApiKey)?;
        let url = self.page_url(api_key, path, page, query);
        debug!("GET {path} page={page}");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| CatalogError::Network {
                endpoint: path.to_string(),
                message: e.without_url().to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(CatalogError::Status {
                endpoint: path.to_string(),
                status: resp.status().as_u16(),
            });
        }
        let body = resp.text().map_err(|e| CatalogError::Network {
            endpoint: path.to_string(),
            message: format!("read body: {}", e.without_url()),
        })?;

        decode_page(kind, path, &body)
    }
}

/// Stand-in used when the HTTP client cannot be built: every request fails
/// with the same error, so the UI still runs from persisted data.
pub struct OfflineSource(pub CatalogError);

impl CatalogSource for OfflineSource {
    fn fetch_page(
        &self,
        _kind: MediaKind,
        _path: &str,
        _page: u32,
        _query: Option<&str>,
    ) -> Result<CatalogPage, CatalogError> {
        Err(self.0.clone())
    }
}

/// Decode a list/search response body into normalized items.
pub fn decode_page(kind: MediaKind, endpoint: &str, body: &str) -> Result<CatalogPage, CatalogError> {
    let raw: RawPage = serde_json::from_str(body).map_err(|e| CatalogError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;
    let received = raw.results.len();
    let items: Vec<CatalogItem> = raw
        .results
        .into_iter()
        .filter_map(|r| kind.normalize(r))
        .collect();
    if items.len() < received {
        debug!(
            "{endpoint}: dropped {} record(s) without an id",
            received - items.len()
        );
    }
    Ok(CatalogPage {
        items,
        total_pages: raw.total_pages,
    })
}

/// Fetch one of the named lists. Top rated walks pages from 1 until the
/// reported page count (bounded by `page_cap`) is exhausted and concatenates
/// them in order; any failing page fails the whole call.
pub fn fetch_collection(
    source: &dyn CatalogSource,
    kind: MediaKind,
    collection: Collection,
    page_cap: u32,
) -> Result<Vec<CatalogItem>, CatalogError> {
    let path = kind.collection_path(collection);
    let first = source.fetch_page(kind, path, 1, None)?;
    let mut items = first.items;

    if !collection.walks_all_pages() {
        return Ok(items);
    }

    let mut total_pages = first.total_pages.unwrap_or(1);
    if total_pages > page_cap {
        warn!("{path}: {total_pages} pages reported, stopping at {page_cap}");
        total_pages = page_cap;
    }

    let mut page = 2;
    while page <= total_pages {
        let next = source.fetch_page(kind, path, page, None)?;
        items.extend(next.items);
        // The count can move while we walk; follow it but never past the cap.
        if let Some(reported) = next.total_pages {
            total_pages = reported.min(page_cap);
        }
        page += 1;
    }

    info!(
        "{path}: {} items over {} page(s)",
        items.len(),
        page.saturating_sub(1)
    );
    Ok(items)
}

/// Free-text search; only the first page is read.
pub fn search(
    source: &dyn CatalogSource,
    kind: MediaKind,
    query: &str,
) -> Result<Vec<CatalogItem>, CatalogError> {
    let page = source.fetch_page(kind, kind.search_path(), 1, Some(query))?;
    Ok(page.items)
}
