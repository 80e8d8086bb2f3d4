use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::info;

use crate::config::MediaConfig;

use super::{StorageBackend, StorageError};

/// S3-backed media storage. Credentials come from the default AWS provider
/// chain (env vars, profile, instance role).
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    pub async fn new(media: &MediaConfig) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(media.s3_region.clone()))
            .load()
            .await;

        info!(bucket = %media.s3_bucket, region = %media.s3_region, "Using S3 media storage");

        Self {
            client: Client::new(&aws_config),
            bucket: media.s3_bucket.clone(),
            public_base_url: media.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn public_url(&self, key: &str) -> String {
        if self.public_base_url.is_empty() {
            format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
        } else {
            format!("{}/{}", self.public_base_url, key)
        }
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(())
    }

    async fn url(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::S3(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}
