// Catalog Client and File Selection
//
// The catalog is the upstream listing of daily data files. One GET per
// invocation: `<endpoint>?date=YYYY-MM-DD` with the credential in the
// `key` header. Selection scans the listing in order for the first file
// whose name contains the feed marker.

use crate::config::LoaderConfig;
use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// One file listed by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub url: String,
    pub md5: String,
    pub name: String,
}

/// Catalog listing response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub msg: String,
    pub code: i32,
    #[serde(default)]
    pub data: Vec<FileEntry>,
}

/// Parsed listing plus the raw body, kept for the echo-back response variant
#[derive(Debug, Clone)]
pub struct CatalogListing {
    pub response: CatalogResponse,
    pub raw_body: String,
}

/// HTTP client for the catalog listing endpoint
pub struct CatalogClient {
    client: Client,
    catalog_url: String,
    api_key: String,
}

impl CatalogClient {
    /// Create a new client from loader configuration
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("buridge-loader/0.1")
            .build()
            .map_err(PipelineError::CatalogUnavailable)?;

        Ok(CatalogClient {
            client,
            catalog_url: config.catalog_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetch the file listing for a calendar date
    pub async fn list_files(&self, date: NaiveDate) -> Result<CatalogListing> {
        let date_param = date.format("%Y-%m-%d").to_string();
        info!(date = %date_param, url = %self.catalog_url, "Querying catalog");

        let response = self
            .client
            .get(&self.catalog_url)
            .query(&[("date", date_param.as_str())])
            .header("key", &self.api_key)
            .send()
            .await
            .map_err(PipelineError::CatalogUnavailable)?;

        let raw_body = response
            .text()
            .await
            .map_err(PipelineError::CatalogUnavailable)?;

        let parsed: CatalogResponse =
            serde_json::from_str(&raw_body).map_err(PipelineError::CatalogDecode)?;

        debug!(
            code = parsed.code,
            files = parsed.data.len(),
            "Catalog responded"
        );

        Ok(CatalogListing {
            response: parsed,
            raw_body,
        })
    }
}

/// Select the first listed file whose name contains the marker
///
/// Listing order is preserved; returns `NotFound` when nothing matches, which
/// the orchestrator surfaces as a not-found outcome rather than a failure.
pub fn select_file<'a>(
    listing: &'a CatalogResponse,
    marker: &str,
    date: NaiveDate,
) -> Result<&'a FileEntry> {
    listing
        .data
        .iter()
        .find(|entry| entry.name.contains(marker))
        .ok_or_else(|| PipelineError::NotFound {
            marker: marker.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
        })
}

// ============================================================================
// Tests
// ============================================================================
