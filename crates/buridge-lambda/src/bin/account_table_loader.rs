//! Account daily data loader: decoded records into the key-value table
//!
//! Batches of 25 (the table's native batch-write limit). On success the
//! response echoes the raw catalog JSON for the scheduler's audit log.

use buridge_lambda::{init_lambda_logging, target_date_from_event, LoaderResponse};
use buridge_pipeline::{
    BatchPolicy, DecodeOptions, LoadTarget, LoaderConfig, Pipeline, RetryPolicy, SuccessBody,
    TableSink, TABLE_BATCH_LIMIT,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::info;

const MARKER: &str = "buridge_dy_account_daily_data";

async fn handle_request(event: LambdaEvent<serde_json::Value>) -> Result<LoaderResponse, Error> {
    let config = match LoaderConfig::from_env(MARKER) {
        Ok(config) => config,
        Err(e) => {
            return Ok(LoaderResponse {
                status_code: 500,
                body: e.to_string(),
            });
        },
    };

    let table = match std::env::var("TABLE_NAME") {
        Ok(table) => table,
        Err(_) => {
            return Ok(LoaderResponse {
                status_code: 500,
                body: "Configuration error: TABLE_NAME is not set".to_string(),
            });
        },
    };

    let date = target_date_from_event(&event.payload);
    info!(date = %date, table = %table, "Account loader invoked");

    let target = LoadTarget::Records {
        sink: Box::new(TableSink::from_env(table).await),
        policy: BatchPolicy::Count(TABLE_BATCH_LIMIT),
        decode: DecodeOptions::default(),
    };

    let pipeline = Pipeline::new(config, target, RetryPolicy::none())
        .with_success_body(SuccessBody::EchoCatalog);

    Ok(pipeline.run(date).await.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
