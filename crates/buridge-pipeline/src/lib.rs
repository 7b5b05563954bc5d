//! Buridge Loader Pipeline
//!
//! The shared ETL pipeline behind the daily feed loaders:
//! fetch-candidate-list -> select-by-predicate -> stream-decode ->
//! batch-write with size/count bounds. Each loader variant fixes a feed
//! marker, a destination sink, and a retry policy; everything else is
//! common.
//!
//! # Example
//!
//! ```no_run
//! use buridge_pipeline::{
//!     BatchPolicy, DecodeOptions, LoadTarget, LoaderConfig, Pipeline, RetryPolicy,
//! };
//!
//! # async fn run(sink: Box<dyn buridge_pipeline::BatchSink>) {
//! let config = LoaderConfig::builder()
//!     .api_key("secret")
//!     .marker("buridge_dy_account_daily_data")
//!     .build();
//!
//! let target = LoadTarget::Records {
//!     sink,
//!     policy: BatchPolicy::Count(buridge_pipeline::TABLE_BATCH_LIMIT),
//!     decode: DecodeOptions::default(),
//! };
//!
//! let pipeline = Pipeline::new(config, target, RetryPolicy::none());
//! let outcome = pipeline.run(chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).await;
//! println!("{} {}", outcome.status, outcome.body);
//! # }
//! ```

pub mod batch;
pub mod catalog;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod retry;
pub mod sink;

pub use batch::{BatchPolicy, BatchSink, Batcher, DOCUMENT_BATCH_MAX_BYTES, TABLE_BATCH_LIMIT};
pub use catalog::{select_file, CatalogClient, CatalogListing, CatalogResponse, FileEntry};
pub use config::LoaderConfig;
pub use decode::{DecodeOptions, FieldValue, Record, RecordStream};
pub use error::{PipelineError, Result};
pub use fetch::Fetcher;
pub use pipeline::{map_outcome, LoadTarget, Pipeline, RunOutcome, RunSummary, SuccessBody};
pub use retry::{retry, RetryPolicy};
pub use sink::{DocumentSink, ObjectStore, TableSink};

/// Yesterday in UTC, the default target date for scheduled invocations
pub fn default_target_date() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive() - chrono::Days::new(1)
}
