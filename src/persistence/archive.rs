//! Archive store implementations: S3, local filesystem and in-memory.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use tokio::sync::RwLock;

use super::ArchiveStore;
use crate::error::StorageError;

/// Archives batches as objects in an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ArchiveStore {
    client: S3Client,
    bucket: String,
}

impl S3ArchiveStore {
    /// Creates a store writing to `bucket` with an existing client.
    #[must_use]
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Builds a client from the ambient AWS configuration chain.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(S3Client::new(&shared), bucket)
    }
}

#[async_trait]
impl ArchiveStore for S3ArchiveStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                StorageError::Archive(format!("failed to put s3://{}/{key}: {e}", self.bucket))
            })?;
        Ok(())
    }
}

/// Archives batches as files under a root directory.
#[derive(Debug, Clone)]
pub struct FilesystemArchiveStore {
    root: PathBuf,
}

impl FilesystemArchiveStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if key.is_empty() || !plain {
            return Err(StorageError::Archive(format!("invalid archive key {key:?}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArchiveStore for FilesystemArchiveStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Archive(format!("{}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| StorageError::Archive(format!("{}: {e}", path.display())))
    }
}

/// Keeps archived objects in memory.
#[derive(Debug, Default)]
pub struct MemoryArchiveStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryArchiveStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the object stored under `key`, if any.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    /// Returns every stored key, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchiveStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        self.objects.write().await.insert(key.to_string(), body);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_overwrites_same_key() {
        let store = MemoryArchiveStore::new();
        assert!(store.put_object("k.json", b"[1]".to_vec()).await.is_ok());
        assert!(store.put_object("k.json", b"[2]".to_vec()).await.is_ok());
        assert_eq!(store.get("k.json").await, Some(b"[2]".to_vec()));
        assert_eq!(store.keys().await, vec!["k.json".to_string()]);
    }

    #[tokio::test]
    async fn filesystem_store_writes_under_root() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("cannot create temp dir");
        };
        let store = FilesystemArchiveStore::new(dir.path().join("archive"));
        assert!(store.put_object("batch.json", b"[]".to_vec()).await.is_ok());

        let written = tokio::fs::read(dir.path().join("archive").join("batch.json")).await;
        assert_eq!(written.ok(), Some(b"[]".to_vec()));
    }

    #[tokio::test]
    async fn filesystem_store_rejects_escaping_keys() {
        let store = FilesystemArchiveStore::new("/tmp/unused");
        assert!(store.put_object("../evil.json", Vec::new()).await.is_err());
        assert!(store.put_object("/abs.json", Vec::new()).await.is_err());
        assert!(store.put_object("", Vec::new()).await.is_err());
    }
}
