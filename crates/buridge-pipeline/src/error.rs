//! Error types for the loader pipeline
//!
//! One variant per failure kind the orchestrator has to map to a response
//! status, so the outcome mapping in `pipeline` stays total.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline error, one variant per stage failure
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or invalid invocation configuration (e.g. no API credential).
    /// Surfaced before any network call, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The catalog endpoint could not be reached
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(#[source] reqwest::Error),

    /// The catalog responded but the body was not a valid listing
    #[error("Catalog response malformed: {0}")]
    CatalogDecode(#[source] serde_json::Error),

    /// No listed file matched the name marker for the requested date.
    /// A distinct not-found outcome, never fatal, never retried.
    #[error("No file matching '{marker}' listed for {date}")]
    NotFound { marker: String, date: String },

    /// Downloading the selected file failed
    #[error("Download failed: {0}")]
    Download(String),

    /// The downloaded container could not be decoded
    #[error("Decode failed: {0}")]
    Decode(String),

    /// A batch flush to the destination store failed
    #[error("Write to destination failed: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a download error
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a destination write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }
}
