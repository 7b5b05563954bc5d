// Object Storage Sink (S3)
//
// This destination takes the raw downloaded file in one PUT; it never sees
// decoded records. Credentials come from the default provider chain (the
// hosting environment's role).

use crate::error::{PipelineError, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
    key_prefix: String,
}

impl ObjectStore {
    /// Create a store from the ambient AWS configuration
    pub async fn from_env(bucket: String, key_prefix: String) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&aws_config), bucket, key_prefix)
    }

    pub fn new(client: Client, bucket: String, key_prefix: String) -> Self {
        ObjectStore {
            client,
            bucket,
            key_prefix,
        }
    }

    /// Object key for a catalog file name
    pub fn build_key(&self, file_name: &str) -> String {
        format!("{}/{}", self.key_prefix.trim_end_matches('/'), file_name)
    }

    /// Upload a local file as one object
    #[instrument(skip(self))]
    pub async fn upload_file(&self, local_path: &Path, key: &str) -> Result<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| PipelineError::write(format!("reading {}: {}", local_path.display(), e)))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| PipelineError::write(format!("S3 put s3://{}/{}: {}", self.bucket, key, e)))?;

        info!("Uploaded to s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
