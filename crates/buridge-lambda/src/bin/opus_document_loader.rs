//! Opus daily data loader: decoded records into the document store
//!
//! Size-bounded batches so each insert call stays under the store's
//! request cap.

use buridge_lambda::{init_lambda_logging, target_date_from_event, LoaderResponse};
use buridge_pipeline::{
    BatchPolicy, DecodeOptions, DocumentSink, LoadTarget, LoaderConfig, Pipeline, RetryPolicy,
    DOCUMENT_BATCH_MAX_BYTES,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::info;

const MARKER: &str = "buridge_dy_opus_daily_data";

fn require_env(name: &str) -> Result<String, LoaderResponse> {
    std::env::var(name).map_err(|_| LoaderResponse {
        status_code: 500,
        body: format!("Configuration error: {name} is not set"),
    })
}

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

    let (uri, database, collection) = match (
        require_env("MONGO_URI"),
        require_env("MONGO_DATABASE"),
        require_env("MONGO_COLLECTION"),
    ) {
        (Ok(uri), Ok(database), Ok(collection)) => (uri, database, collection),
        (Err(r), _, _) | (_, Err(r), _) | (_, _, Err(r)) => return Ok(r),
    };

    let date = target_date_from_event(&event.payload);
    info!(date = %date, collection = %collection, "Opus loader invoked");

    let sink = match DocumentSink::connect(&uri, &database, &collection).await {
        Ok(sink) => sink,
        Err(e) => {
            return Ok(LoaderResponse {
                status_code: 500,
                body: format!("Failed to process: {e}"),
            });
        },
    };

    let target = LoadTarget::Records {
        sink: Box::new(sink),
        policy: BatchPolicy::Size(DOCUMENT_BATCH_MAX_BYTES),
        decode: DecodeOptions::default(),
    };

    let pipeline = Pipeline::new(config, target, RetryPolicy::none());
    Ok(pipeline.run(date).await.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
