// Loader Configuration
//
// One explicit struct, constructed once at process start and passed to the
// orchestrator. The pipeline itself never reads the environment.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default catalog listing endpoint
pub const DEFAULT_CATALOG_URL: &str =
    "https://api.newrank.cn/api/v2/custom/common/buridge/file/list";

/// Default HTTP timeout in seconds (large daily files)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for one loader invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Catalog listing endpoint
    pub catalog_url: String,

    /// API credential sent as the `key` header
    pub api_key: String,

    /// Substring marker selecting this feed's file from the listing
    /// (e.g. "buridge_dy_product_daily_data")
    pub marker: String,

    /// Local scratch directory for the downloaded file
    pub scratch_dir: PathBuf,

    /// HTTP client timeout in seconds
    pub timeout_secs: u64,

    /// Verify the downloaded file against the catalog-reported MD5
    pub verify_checksum: bool,
}

impl LoaderConfig {
    /// Create new config with builder pattern
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// - `key`: API credential (required — absence is a configuration error)
    /// - `CATALOG_URL`: listing endpoint override
    /// - `HTTP_TIMEOUT_SECS`: client timeout override
    /// - `VERIFY_CHECKSUM`: enable MD5 verification of downloads
    ///
    /// The marker is fixed per loader variant, not read from the
    /// environment, so it is passed in by the entry point.
    pub fn from_env(marker: &str) -> Result<Self> {
        let api_key = std::env::var("key")
            .map_err(|_| PipelineError::config("API key is not set in environment variables"))?;

        Ok(LoaderConfig {
            catalog_url: std::env::var("CATALOG_URL")
                .unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string()),
            api_key,
            marker: marker.to_string(),
            scratch_dir: std::env::temp_dir(),
            timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            verify_checksum: std::env::var("VERIFY_CHECKSUM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.catalog_url.is_empty() {
            return Err(PipelineError::config("Catalog URL cannot be empty"));
        }

        if self.api_key.is_empty() {
            return Err(PipelineError::config("API key cannot be empty"));
        }

        if self.marker.is_empty() {
            return Err(PipelineError::config("File name marker cannot be empty"));
        }

        if self.timeout_secs == 0 {
            return Err(PipelineError::config("Timeout must be greater than 0"));
        }

        Ok(())
    }
}

/// Builder for LoaderConfig
#[derive(Debug, Default)]
pub struct LoaderConfigBuilder {
    catalog_url: Option<String>,
    api_key: Option<String>,
    marker: Option<String>,
    scratch_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
    verify_checksum: Option<bool>,
}

impl LoaderConfigBuilder {
    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = Some(verify);
        self
    }

    pub fn build(self) -> LoaderConfig {
        LoaderConfig {
            catalog_url: self
                .catalog_url
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            api_key: self.api_key.unwrap_or_default(),
            marker: self.marker.unwrap_or_default(),
            scratch_dir: self.scratch_dir.unwrap_or_else(std::env::temp_dir),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            verify_checksum: self.verify_checksum.unwrap_or(false),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LoaderConfig {
        LoaderConfig::builder()
            .api_key("test-key")
            .marker("buridge_dy_product_daily_data")
            .build()
    }

    #[test]
    fn test_builder_defaults() {
        let config = test_config();
        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.verify_checksum);
    }

    #[test]
    fn test_validate_ok() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_key() {
        let config = LoaderConfig::builder().marker("m").build();
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_validate_empty_marker() {
        let config = LoaderConfig::builder().api_key("k").build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = LoaderConfig::builder()
            .api_key("k")
            .marker("m")
            .timeout_secs(0)
            .build();
        assert!(config.validate().is_err());
    }
}
