// File Fetcher
//
// Streaming GET of the selected catalog file into scratch storage. The
// scratch path is the shared temp directory joined with the catalog-reported
// file name verbatim; an existing file at that path is overwritten.
// Retry policy lives in the orchestrator, not here.

use crate::catalog::FileEntry;
use crate::error::{PipelineError, Result};
use futures::StreamExt;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Downloads catalog files to local scratch storage
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher with the given HTTP timeout
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PipelineError::download(e.to_string()))?;

        Ok(Fetcher { client })
    }

    /// Download a catalog entry into the scratch directory
    ///
    /// Returns the local path of the downloaded file. When `verify_md5` is
    /// set, the file is checked against the catalog-reported digest after
    /// the copy completes.
    pub async fn fetch_entry(
        &self,
        entry: &FileEntry,
        scratch_dir: &Path,
        verify_md5: bool,
    ) -> Result<PathBuf> {
        let local_path = scratch_dir.join(&entry.name);
        self.fetch_url(&entry.url, &local_path).await?;

        if verify_md5 {
            buridge_common::verify_file_md5(&local_path, &entry.md5)
                .map_err(|e| PipelineError::download(e.to_string()))?;
            debug!(file = %entry.name, "Checksum verified");
        }

        Ok(local_path)
    }

    /// Streaming GET of a URL to a local path, overwriting any existing file
    pub async fn fetch_url(&self, url: &str, local_path: &Path) -> Result<()> {
        info!(url = %url, path = %local_path.display(), "Downloading file");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::download(format!(
                "HTTP error downloading {}: {}",
                url,
                response.status()
            )));
        }

        let mut file = std::fs::File::create(local_path)
            .map_err(|e| PipelineError::download(format!("creating {}: {}", local_path.display(), e)))?;

        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PipelineError::download(e.to_string()))?;
            file.write_all(&chunk)
                .map_err(|e| PipelineError::download(e.to_string()))?;
            downloaded += chunk.len() as u64;
        }

        info!(
            bytes = downloaded,
            path = %local_path.display(),
            "Download complete"
        );

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
