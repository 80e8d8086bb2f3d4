use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use super::{StorageBackend, StorageError};

/// Filesystem-backed media storage for development and single-node
/// deployments. Stored files are served under /uploads by the router.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(upload_dir: impl AsRef<Path>) -> Self {
        Self {
            root: upload_dir.as_ref().to_path_buf(),
        }
    }

    /// Resolve a key beneath the upload root, rejecting traversal attempts.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key.starts_with('/')
            || key.split('/').any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;

        Ok(format!("/uploads/{}", key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("File already absent during delete: {}", path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn url(&self, key: &str, _expires_in: Duration) -> Result<String, StorageError> {
        self.resolve(key)?;
        Ok(format!("/uploads/{}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal_keys() {
        let storage = LocalStorage::new("uploads");
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("/absolute").is_err());
        assert!(storage.resolve("a//b").is_err());
        assert!(storage.resolve("").is_err());
    }

    #[test]
    fn accepts_nested_keys() {
        let storage = LocalStorage::new("uploads");
        let path = storage.resolve("forum/2026/08/07/file.png").unwrap();
        assert!(path.ends_with("forum/2026/08/07/file.png"));
    }

    #[tokio::test]
    async fn put_then_delete_round_trips() {
        let dir = std::env::temp_dir().join(format!("campus-media-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(&dir);

        let url = storage
            .put("test/file.txt", b"hello".to_vec(), "text/plain")
            .await
            .unwrap();
        assert_eq!(url, "/uploads/test/file.txt");
        assert_eq!(fs::read(dir.join("test/file.txt")).await.unwrap(), b"hello");

        storage.delete("test/file.txt").await.unwrap();
        // Second delete is a no-op, not an error
        storage.delete("test/file.txt").await.unwrap();

        let _ = fs::remove_dir_all(&dir).await;
    }
}
