//! Lambda entry points for the daily feed loaders
//!
//! One binary per loader variant; this crate holds the pieces they share:
//! the proxy-style response shape, target date resolution from the event
//! payload, and logging setup for the hosting environment.

use buridge_common::logging::{init_logging, LogConfig, LogFormat};
use buridge_pipeline::{default_target_date, RunOutcome};
use chrono::NaiveDate;
use serde::Serialize;

/// Proxy-style invocation response
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoaderResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl From<RunOutcome> for LoaderResponse {
    fn from(outcome: RunOutcome) -> Self {
        LoaderResponse {
            status_code: outcome.status,
            body: outcome.body,
        }
    }
}

/// Target date for a scheduled or manual invocation
///
/// Scheduled events carry no date and get yesterday (UTC); a manual
/// invocation may override with `{"date": "YYYY-MM-DD"}`. An unparseable
/// override falls back to yesterday rather than failing the run.
pub fn target_date_from_event(payload: &serde_json::Value) -> NaiveDate {
    payload
        .get("date")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(default_target_date)
}

/// Initialize logging for the Lambda environment
///
/// JSON to stdout unless overridden; the host captures and ships it.
pub fn init_lambda_logging() {
    let config = LogConfig::from_env().unwrap_or_else(|_| LogConfig {
        format: LogFormat::Json,
        include_targets: true,
        ..LogConfig::default()
    });

    // A second cold-start init in local testing is harmless
    let _ = init_logging(&config);
}
