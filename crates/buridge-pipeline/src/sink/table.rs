// Key-Value Table Sink (DynamoDB)
//
// Batched put-item writes. The batcher runs this sink under
// `BatchPolicy::Count(TABLE_BATCH_LIMIT)`, matching the backend's native
// batch-write limit; a batch that comes back with unprocessed items is a
// write failure, not silently partial.

use crate::batch::BatchSink;
use crate::decode::{FieldValue, Record};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub struct TableSink {
    client: Client,
    table: String,
}

impl TableSink {
    /// Create a sink from the ambient AWS configuration
    pub async fn from_env(table: String) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&aws_config), table)
    }

    pub fn new(client: Client, table: String) -> Self {
        TableSink { client, table }
    }

    fn to_item(record: &Record) -> HashMap<String, AttributeValue> {
        record
            .fields
            .iter()
            .map(|(name, value)| {
                let attr = match value {
                    FieldValue::Present(s) => AttributeValue::S(s.clone()),
                    FieldValue::Absent => AttributeValue::Null(true),
                };
                (name.clone(), attr)
            })
            .collect()
    }
}

#[async_trait]
impl BatchSink for TableSink {
    #[instrument(skip(self, batch), fields(table = %self.table, records = batch.len()))]
    async fn write_batch(&self, batch: &[Record]) -> Result<()> {
        let mut requests = Vec::with_capacity(batch.len());
        for record in batch {
            let put = PutRequest::builder()
                .set_item(Some(Self::to_item(record)))
                .build()
                .map_err(|e| PipelineError::write(format!("building put request: {}", e)))?;
            requests.push(WriteRequest::builder().put_request(put).build());
        }

        let output = self
            .client
            .batch_write_item()
            .request_items(&self.table, requests)
            .send()
            .await
            .map_err(|e| PipelineError::write(format!("batch write to {}: {}", self.table, e)))?;

        if let Some(unprocessed) = output.unprocessed_items() {
            let leftover: usize = unprocessed.values().map(|v| v.len()).sum();
            if leftover > 0 {
                return Err(PipelineError::write(format!(
                    "{} items left unprocessed by {}",
                    leftover, self.table
                )));
            }
        }

        debug!("Batch written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_to_item_maps_present_and_absent() {
        let mut fields = BTreeMap::new();
        fields.insert("item_id".to_string(), FieldValue::Present("a1".to_string()));
        fields.insert("title".to_string(), FieldValue::Absent);
        let record = Record { fields };

        let item = TableSink::to_item(&record);
        assert_eq!(item["item_id"], AttributeValue::S("a1".to_string()));
        assert_eq!(item["title"], AttributeValue::Null(true));
    }
}
