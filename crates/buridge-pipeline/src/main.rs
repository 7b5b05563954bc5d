//! buridge - local runner for the daily feed loaders

use anyhow::Result;
use buridge_common::logging::{init_logging, LogConfig, LogLevel};
use buridge_pipeline::{
    default_target_date, BatchPolicy, DecodeOptions, DocumentSink, LoadTarget, LoaderConfig,
    ObjectStore, Pipeline, RetryPolicy, SuccessBody, TableSink, DOCUMENT_BATCH_MAX_BYTES,
    TABLE_BATCH_LIMIT,
};
use chrono::NaiveDate;
use clap::Parser;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "buridge")]
#[command(author, version, about = "Daily feed loader")]
struct Cli {
    /// Destination to load into
    #[command(subcommand)]
    destination: Destination,

    /// Target date (YYYY-MM-DD); defaults to yesterday UTC
    #[arg(short, long, global = true)]
    date: Option<NaiveDate>,

    /// File name marker selecting the feed
    #[arg(short, long, global = true, default_value = "buridge_dy_product_daily_data")]
    marker: String,

    /// Retry the whole pipeline up to 5 times
    #[arg(long, global = true)]
    retry: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Destination {
    /// Upload the raw file to object storage
    Object {
        /// Destination bucket
        #[arg(short, long, env = "BUCKET_NAME")]
        bucket: String,

        /// Object key prefix
        #[arg(short, long, default_value = "NewRank/buridge_dy_product_daily_data")]
        prefix: String,
    },

    /// Batch-write decoded records to the key-value table
    Table {
        /// Destination table
        #[arg(short, long, env = "TABLE_NAME")]
        table: String,
    },

    /// Batch-insert decoded records into the document store
    Document {
        /// Connection string
        #[arg(long, env = "MONGO_URI")]
        uri: String,

        /// Database name
        #[arg(long, env = "MONGO_DATABASE")]
        database: String,

        /// Collection name
        #[arg(long, env = "MONGO_COLLECTION")]
        collection: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::from_env().unwrap_or_else(|_| LogConfig::with_level(log_level));
    init_logging(&log_config)?;

    let config = LoaderConfig::from_env(&cli.marker)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let target = match cli.destination {
        Destination::Object { bucket, prefix } => {
            LoadTarget::Object(ObjectStore::from_env(bucket, prefix).await)
        },
        Destination::Table { table } => LoadTarget::Records {
            sink: Box::new(TableSink::from_env(table).await),
            policy: BatchPolicy::Count(TABLE_BATCH_LIMIT),
            decode: DecodeOptions::default(),
        },
        Destination::Document {
            uri,
            database,
            collection,
        } => LoadTarget::Records {
            sink: Box::new(
                DocumentSink::connect(&uri, &database, &collection)
                    .await
                    .map_err(|e| anyhow::anyhow!("{e}"))?,
            ),
            policy: BatchPolicy::Size(DOCUMENT_BATCH_MAX_BYTES),
            decode: DecodeOptions::default(),
        },
    };

    let retry_policy = if cli.retry {
        RetryPolicy::fixed(5, Duration::from_secs(1))
    } else {
        RetryPolicy::none()
    };

    let date = cli.date.unwrap_or_else(default_target_date);
    info!(date = %date, marker = %cli.marker, "Running loader");

    let pipeline = Pipeline::new(config, target, retry_policy)
        .with_success_body(SuccessBody::Confirmation);
    let outcome = pipeline.run(date).await;

    info!(status = outcome.status, "Run finished: {}", outcome.body);
    if outcome.status >= 500 {
        anyhow::bail!("loader failed: {}", outcome.body);
    }

    Ok(())
}
