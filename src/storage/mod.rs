pub mod local;
pub mod s3;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::MediaConfig;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object storage operation failed: {0}")]
    S3(String),
    #[error("Filesystem operation failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A place uploaded files live. Implementations must be safe to share
/// across request tasks.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Backend identifier persisted on media records ("s3" or "local").
    fn name(&self) -> &'static str;

    /// Store the object and return its retrievable URL.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Remove the object. Missing objects are not an error; deletion is
    /// best-effort from the caller's point of view.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// A URL valid for at least `expires_in` (presigned on S3, stable path
    /// on the local backend).
    async fn url(&self, key: &str, expires_in: Duration) -> Result<String, StorageError>;
}

/// Build the backend selected by configuration.
pub async fn from_config(media: &MediaConfig) -> Arc<dyn StorageBackend> {
    if media.backend == "s3" {
        Arc::new(s3::S3Storage::new(media).await)
    } else {
        Arc::new(local::LocalStorage::new(&media.upload_dir))
    }
}
