//! Product daily data loader: raw file into object storage
//!
//! The original variant; the only one that wraps the whole pipeline in a
//! bounded retry (5 attempts, 1s pause).

use buridge_lambda::{init_lambda_logging, target_date_from_event, LoaderResponse};
use buridge_pipeline::{LoadTarget, LoaderConfig, ObjectStore, Pipeline, RetryPolicy};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::time::Duration;
use tracing::info;

const MARKER: &str = "buridge_dy_product_daily_data";
const DEFAULT_KEY_PREFIX: &str = "NewRank/buridge_dy_product_daily_data";

async fn handle_request(event: LambdaEvent<serde_json::Value>) -> Result<LoaderResponse, Error> {
    let config = match LoaderConfig::from_env(MARKER) {
        Ok(config) => config,
        Err(e) => {
            // Missing credential is a response, not a crash
            return Ok(LoaderResponse {
                status_code: 500,
                body: e.to_string(),
            });
        },
    };

    let bucket = match std::env::var("BUCKET_NAME") {
        Ok(bucket) => bucket,
        Err(_) => {
            return Ok(LoaderResponse {
                status_code: 500,
                body: "Configuration error: BUCKET_NAME is not set".to_string(),
            });
        },
    };
    let prefix =
        std::env::var("S3_KEY_PREFIX").unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string());

    let date = target_date_from_event(&event.payload);
    info!(date = %date, bucket = %bucket, "Product loader invoked");

    let store = ObjectStore::from_env(bucket, prefix).await;
    let pipeline = Pipeline::new(
        config,
        LoadTarget::Object(store),
        RetryPolicy::fixed(5, Duration::from_secs(1)),
    );

    Ok(pipeline.run(date).await.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
