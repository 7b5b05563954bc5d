// Document Store Sink (MongoDB)
//
// Batched insert-many writes. The batcher runs this sink under
// `BatchPolicy::Size(DOCUMENT_BATCH_MAX_BYTES)` so one insert call stays
// under the backend's request size cap.

use crate::batch::BatchSink;
use crate::decode::Record;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use mongodb::bson::Document;
use mongodb::{Client, Collection};
use tracing::{debug, instrument};

pub struct DocumentSink {
    collection: Collection<Document>,
}

impl DocumentSink {
    /// Connect and bind to one collection
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| PipelineError::write(format!("connecting to document store: {}", e)))?;

        Ok(DocumentSink {
            collection: client.database(database).collection(collection),
        })
    }

    pub fn new(collection: Collection<Document>) -> Self {
        DocumentSink { collection }
    }

    fn to_document(record: &Record) -> Result<Document> {
        mongodb::bson::to_document(&record.to_json())
            .map_err(|e| PipelineError::write(format!("encoding document: {}", e)))
    }
}

#[async_trait]
impl BatchSink for DocumentSink {
    #[instrument(skip(self, batch), fields(records = batch.len()))]
    async fn write_batch(&self, batch: &[Record]) -> Result<()> {
        let documents: Vec<Document> = batch
            .iter()
            .map(Self::to_document)
            .collect::<Result<_>>()?;

        self.collection
            .insert_many(documents)
            .await
            .map_err(|e| PipelineError::write(format!("insert_many: {}", e)))?;

        debug!("Batch inserted");
        Ok(())
    }
}
