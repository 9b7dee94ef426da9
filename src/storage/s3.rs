//! AWS S3 storage.
//!
//! The seen state is a single JSON object at `s3://{bucket}/{key}`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::StorageConfig;
use crate::storage::{SeenState, SeenStore};

/// S3 object backend.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Build from the storage section, using the default AWS credential chain.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .s3_bucket
            .clone()
            .or_else(|| std::env::var("S3_BUCKET").ok())
            .ok_or_else(|| AppError::config("storage.s3_bucket is not set"))?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Ok(Self::new(Client::new(&aws_config), bucket, &config.s3_key))
    }

    /// Read an object, returning None if the key doesn't exist.
    pub async fn read_bytes_optional(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::S3(e.to_string()))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No object at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    async fn write_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::S3(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SeenStore for S3Storage {
    async fn load(&self) -> Result<SeenState> {
        match self.read_bytes_optional(&self.key).await {
            Ok(Some(bytes)) => SeenState::from_json(&bytes)
                .map_err(|e| AppError::StoreLoad(format!("{}: {}", self.describe(), e))),
            Ok(None) => Ok(SeenState::new()),
            Err(e) => Err(AppError::StoreLoad(format!("{}: {}", self.describe(), e))),
        }
    }

    async fn save(&self, state: &SeenState) -> Result<()> {
        let bytes = state.to_json()?;
        self.write_bytes(&self.key, bytes)
            .await
            .map_err(|e| AppError::StoreSave(format!("{}: {}", self.describe(), e)))?;
        log::info!(
            "Wrote {} jobs to {}",
            state.total_jobs(),
            self.describe()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}
