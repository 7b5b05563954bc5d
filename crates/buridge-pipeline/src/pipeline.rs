// Pipeline Orchestration
//
// Sequences catalog -> select -> fetch -> load in strict order, wraps the
// whole sequence in the variant's retry policy, and maps the terminal
// result to an invocation response. No overlap, no concurrency: one
// invocation loads one date's worth of one feed.

use crate::batch::{load_records, BatchPolicy, BatchSink};
use crate::catalog::{select_file, CatalogClient};
use crate::config::LoaderConfig;
use crate::decode::{DecodeOptions, RecordStream};
use crate::error::{PipelineError, Result};
use crate::fetch::Fetcher;
use crate::retry::{retry, RetryPolicy};
use crate::sink::ObjectStore;
use chrono::NaiveDate;
use tracing::info;

/// Where a run delivers its data
pub enum LoadTarget {
    /// Whole-file PUT of the raw download; no decoding
    Object(ObjectStore),
    /// Decode and batch-write records
    Records {
        sink: Box<dyn BatchSink>,
        policy: BatchPolicy,
        decode: DecodeOptions,
    },
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub file_name: String,
    pub records_written: u64,
    pub raw_catalog_body: String,
}

/// Invocation response: status plus a short body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: u16,
    pub body: String,
}

/// What the response body carries on success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessBody {
    /// Fixed confirmation message
    Confirmation,
    /// The raw catalog JSON echoed back
    EchoCatalog,
}

/// One loader pipeline, fixed to a feed marker and a destination
pub struct Pipeline {
    config: LoaderConfig,
    target: LoadTarget,
    retry_policy: RetryPolicy,
    success_body: SuccessBody,
}

impl Pipeline {
    pub fn new(config: LoaderConfig, target: LoadTarget, retry_policy: RetryPolicy) -> Self {
        Pipeline {
            config,
            target,
            retry_policy,
            success_body: SuccessBody::Confirmation,
        }
    }

    pub fn with_success_body(mut self, body: SuccessBody) -> Self {
        self.success_body = body;
        self
    }

    /// Run the pipeline for one date and map the result to a response
    pub async fn run(&self, date: NaiveDate) -> RunOutcome {
        let result = retry(&self.retry_policy, || self.run_once(date)).await;
        map_outcome(result, self.success_body)
    }

    /// One attempt of the full sequence
    async fn run_once(&self, date: NaiveDate) -> Result<RunSummary> {
        // Configuration problems surface before any network call
        self.config.validate()?;

        let catalog = CatalogClient::new(&self.config)?;
        let listing = catalog.list_files(date).await?;

        let entry = select_file(&listing.response, &self.config.marker, date)?;
        info!(file = %entry.name, "Selected catalog file");

        let fetcher = Fetcher::new(self.config.timeout_secs)?;
        let local_path = fetcher
            .fetch_entry(entry, &self.config.scratch_dir, self.config.verify_checksum)
            .await?;

        let records_written = match &self.target {
            LoadTarget::Object(store) => {
                let key = store.build_key(&entry.name);
                store.upload_file(&local_path, &key).await?;
                0
            },
            LoadTarget::Records {
                sink,
                policy,
                decode,
            } => {
                let stream = RecordStream::open(&local_path, *decode)?;
                load_records(stream, *policy, sink.as_ref()).await?
            },
        };

        Ok(RunSummary {
            file_name: entry.name.clone(),
            records_written,
            raw_catalog_body: listing.raw_body,
        })
    }
}

/// Map a terminal pipeline result to the invocation response
pub fn map_outcome(result: Result<RunSummary>, success_body: SuccessBody) -> RunOutcome {
    match result {
        Ok(summary) => RunOutcome {
            status: 200,
            body: match success_body {
                SuccessBody::Confirmation => "load complete".to_string(),
                SuccessBody::EchoCatalog => summary.raw_catalog_body,
            },
        },
        Err(e @ PipelineError::Config(_)) => RunOutcome {
            status: 500,
            body: e.to_string(),
        },
        Err(e @ PipelineError::NotFound { .. }) => RunOutcome {
            status: 404,
            body: e.to_string(),
        },
        Err(e) => RunOutcome {
            status: 500,
            body: format!("Failed to process: {}", e),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            file_name: "f.avro".to_string(),
            records_written: 3,
            raw_catalog_body: r#"{"msg":"success","code":0,"data":[]}"#.to_string(),
        }
    }

    #[test]
    fn test_success_confirmation() {
        let outcome = map_outcome(Ok(summary()), SuccessBody::Confirmation);
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.body, "load complete");
    }

    #[test]
    fn test_success_echoes_catalog() {
        let outcome = map_outcome(Ok(summary()), SuccessBody::EchoCatalog);
        assert_eq!(outcome.status, 200);
        assert!(outcome.body.contains(r#""code":0"#));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = PipelineError::NotFound {
            marker: "buridge_dy_opus_daily_data".to_string(),
            date: "2024-06-01".to_string(),
        };
        let outcome = map_outcome(Err(err), SuccessBody::Confirmation);
        assert_eq!(outcome.status, 404);
        assert!(outcome.body.contains("buridge_dy_opus_daily_data"));
    }

    #[test]
    fn test_config_error_maps_to_500() {
        let err = PipelineError::config("API key is not set in environment variables");
        let outcome = map_outcome(Err(err), SuccessBody::Confirmation);
        assert_eq!(outcome.status, 500);
        assert!(outcome.body.contains("API key"));
    }

    #[test]
    fn test_stage_error_embeds_text() {
        let err = PipelineError::write("batch write to feed_table: throttled");
        let outcome = map_outcome(Err(err), SuccessBody::Confirmation);
        assert_eq!(outcome.status, 500);
        assert!(outcome.body.starts_with("Failed to process:"));
        assert!(outcome.body.contains("throttled"));
    }
}
