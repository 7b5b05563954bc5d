//! End-to-end pipeline tests against a mocked catalog and file host
//!
//! These cover the full sequence: catalog query with credential header,
//! marker selection, streaming download into a scratch dir, container
//! decode with nullable-union unwrapping, and batched writes into a
//! recording sink. Destination backends themselves are not exercised here.

use apache_avro::types::Value;
use apache_avro::{Schema, Writer};
use async_trait::async_trait;
use buridge_pipeline::{
    BatchPolicy, BatchSink, DecodeOptions, FieldValue, LoadTarget, LoaderConfig, Pipeline, Record,
    Result as PipelineResult, RetryPolicy, SuccessBody,
};
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MARKER: &str = "buridge_dy_product_daily_data";
const FILE_NAME: &str = "buridge_dy_product_daily_data_2024.avro";

/// Sink that records every flushed batch
#[derive(Default, Clone)]
struct RecordingSink {
    batches: Arc<Mutex<Vec<Vec<Record>>>>,
}

#[async_trait]
impl BatchSink for RecordingSink {
    async fn write_batch(&self, batch: &[Record]) -> PipelineResult<()> {
        self.batches.lock().unwrap().push(batch.to_vec());
        Ok(())
    }
}

fn target_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Avro container with `count` entries, titles alternating present/absent
fn avro_fixture(count: usize) -> Vec<u8> {
    let schema = Schema::parse_str(
        r#"
        {
            "type": "record",
            "name": "daily_entry",
            "fields": [
                {"name": "item_id", "type": "string"},
                {"name": "title", "type": ["null", "string"], "default": null}
            ]
        }
        "#,
    )
    .unwrap();

    let mut writer = Writer::new(&schema, Vec::new());
    for i in 0..count {
        let title = if i % 2 == 0 {
            Value::Union(1, Box::new(Value::String(format!("title {i}"))))
        } else {
            Value::Union(0, Box::new(Value::Null))
        };
        writer
            .append(Value::Record(vec![
                ("item_id".to_string(), Value::String(format!("item-{i}"))),
                ("title".to_string(), title),
            ]))
            .unwrap();
    }
    writer.into_inner().unwrap()
}

fn catalog_body(server_uri: &str, names: &[&str]) -> serde_json::Value {
    let data: Vec<serde_json::Value> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "url": format!("{server_uri}/files/{name}"),
                "md5": "d41d8cd98f00b204e9800998ecf8427e",
                "name": name,
            })
        })
        .collect();

    serde_json::json!({"msg": "success", "code": 0, "data": data})
}

fn test_config(server: &MockServer, scratch: &tempfile::TempDir) -> LoaderConfig {
    LoaderConfig::builder()
        .catalog_url(format!("{}/api/file/list", server.uri()))
        .api_key("test-key")
        .marker(MARKER)
        .scratch_dir(scratch.path())
        .timeout_secs(10)
        .build()
}

fn record_target(sink: RecordingSink) -> LoadTarget {
    LoadTarget::Records {
        sink: Box::new(sink),
        policy: BatchPolicy::Count(25),
        decode: DecodeOptions::default(),
    }
}

#[tokio::test]
async fn test_full_record_load() {
    let server = MockServer::start().await;
    let scratch = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/file/list"))
        .and(query_param("date", "2024-06-01"))
        .and(header("key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(catalog_body(&server.uri(), &[FILE_NAME, "other.avro"])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/files/{FILE_NAME}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(avro_fixture(60)))
        .mount(&server)
        .await;

    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(
        test_config(&server, &scratch),
        record_target(sink.clone()),
        RetryPolicy::none(),
    );

    let outcome = pipeline.run(target_date()).await;
    assert_eq!(outcome.status, 200);
    assert_eq!(outcome.body, "load complete");

    // 60 records at count 25: flushes of 25, 25, 10
    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].len(), 25);
    assert_eq!(batches[2].len(), 10);

    // Nullable unions were unwrapped to bare scalars / absent
    assert_eq!(
        batches[0][0].fields["title"],
        FieldValue::Present("title 0".to_string())
    );
    assert_eq!(batches[0][1].fields["title"], FieldValue::Absent);

    // Scratch file kept the catalog-reported name verbatim
    assert!(scratch.path().join(FILE_NAME).exists());
}

#[tokio::test]
async fn test_no_matching_file_is_not_found_without_download() {
    let server = MockServer::start().await;
    let scratch = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/file/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(catalog_body(&server.uri(), &["other.avro"])),
        )
        .mount(&server)
        .await;

    // No download request may be issued for a not-found date
    Mock::given(method("GET"))
        .and(path("/files/other.avro"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(
        test_config(&server, &scratch),
        record_target(sink.clone()),
        RetryPolicy::none(),
    );

    let outcome = pipeline.run(target_date()).await;
    assert_eq!(outcome.status, 404);
    assert!(outcome.body.contains(MARKER));
    assert!(sink.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_credential_reported_before_any_network_call() {
    let server = MockServer::start().await;
    let scratch = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/file/list"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server, &scratch);
    config.api_key = String::new();

    let pipeline = Pipeline::new(config, record_target(RecordingSink::default()), RetryPolicy::none());
    let outcome = pipeline.run(target_date()).await;

    assert_eq!(outcome.status, 500);
    assert!(outcome.body.contains("Configuration error"));
}

#[tokio::test]
async fn test_retry_wrapper_reattempts_catalog_failures() {
    let server = MockServer::start().await;
    let scratch = tempfile::tempdir().unwrap();

    // A body that is not a listing fails every attempt
    Mock::given(method("GET"))
        .and(path("/api/file/list"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(5)
        .mount(&server)
        .await;

    let pipeline = Pipeline::new(
        test_config(&server, &scratch),
        record_target(RecordingSink::default()),
        RetryPolicy::no_delay(5),
    );

    let outcome = pipeline.run(target_date()).await;
    assert_eq!(outcome.status, 500);
    assert!(outcome.body.starts_with("Failed to process:"));

    server.verify().await;
}

#[tokio::test]
async fn test_echo_catalog_success_body() {
    let server = MockServer::start().await;
    let scratch = tempfile::tempdir().unwrap();

    let body = catalog_body(&server.uri(), &[FILE_NAME]);
    Mock::given(method("GET"))
        .and(path("/api/file/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/files/{FILE_NAME}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(avro_fixture(3)))
        .mount(&server)
        .await;

    let pipeline = Pipeline::new(
        test_config(&server, &scratch),
        record_target(RecordingSink::default()),
        RetryPolicy::none(),
    )
    .with_success_body(SuccessBody::EchoCatalog);

    let outcome = pipeline.run(target_date()).await;
    assert_eq!(outcome.status, 200);
    assert!(outcome.body.contains(FILE_NAME));
    assert!(outcome.body.contains(r#""code":0"#));
}

#[tokio::test]
async fn test_checksum_mismatch_fails_download_stage() {
    let server = MockServer::start().await;
    let scratch = tempfile::tempdir().unwrap();

    // The fixture bytes do not hash to the catalog's all-zero digest
    let mut body = catalog_body(&server.uri(), &[FILE_NAME]);
    body["data"][0]["md5"] = serde_json::json!("00000000000000000000000000000000");

    Mock::given(method("GET"))
        .and(path("/api/file/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/files/{FILE_NAME}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(avro_fixture(1)))
        .mount(&server)
        .await;

    let mut config = test_config(&server, &scratch);
    config.verify_checksum = true;

    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(config, record_target(sink.clone()), RetryPolicy::none());

    let outcome = pipeline.run(target_date()).await;
    assert_eq!(outcome.status, 500);
    assert!(outcome.body.contains("mismatch"));
    assert!(sink.batches.lock().unwrap().is_empty());
}
