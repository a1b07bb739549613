//! # In-Memory Backing Store
//!
//! Process-local store with the same version semantics as the remote
//! contents API. Used by the `memory` backend and by tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::backend::{BlobEntry, BlobStore, StoredBlob};
use super::errors::{BlobStoreError, BlobStoreResult};

/// In-memory blob store
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<BTreeMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> BlobStoreError {
        BlobStoreError::Transport("Lock poisoned".to_string())
    }
}

/// Version token for a content body: sha256 over a git-style blob header
fn content_version(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn read_blob(&self, name: &str) -> BlobStoreResult<StoredBlob> {
        let blobs = self.blobs.read().map_err(|_| Self::poisoned())?;
        blobs
            .get(name)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(name.to_string()))
    }

    async fn write_blob(
        &self,
        name: &str,
        content: &[u8],
        expected_version: Option<&str>,
    ) -> BlobStoreResult<String> {
        let mut blobs = self.blobs.write().map_err(|_| Self::poisoned())?;

        match (blobs.get(name), expected_version) {
            (Some(current), Some(expected)) if current.version == expected => {}
            (Some(_), _) => return Err(BlobStoreError::Conflict(name.to_string())),
            (None, Some(_)) => return Err(BlobStoreError::NotFound(name.to_string())),
            (None, None) => {}
        }

        let version = content_version(content);
        blobs.insert(
            name.to_string(),
            StoredBlob {
                content: content.to_vec(),
                version: version.clone(),
            },
        );
        Ok(version)
    }

    async fn delete_blob(&self, name: &str, expected_version: &str) -> BlobStoreResult<()> {
        let mut blobs = self.blobs.write().map_err(|_| Self::poisoned())?;

        match blobs.get(name) {
            None => Err(BlobStoreError::NotFound(name.to_string())),
            Some(current) if current.version != expected_version => {
                Err(BlobStoreError::Conflict(name.to_string()))
            }
            Some(_) => {
                blobs.remove(name);
                Ok(())
            }
        }
    }

    async fn list_blobs(&self, prefix: &str) -> BlobStoreResult<Vec<BlobEntry>> {
        let blobs = self.blobs.read().map_err(|_| Self::poisoned())?;
        let dir = format!("{}/", prefix.trim_end_matches('/'));

        Ok(blobs
            .iter()
            .filter(|(name, _)| {
                name.strip_prefix(&dir)
                    .map(|rest| !rest.is_empty() && !rest.contains('/'))
                    .unwrap_or(false)
            })
            .map(|(name, blob)| BlobEntry {
                name: name.clone(),
                version: blob.version.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_read() {
        let store = InMemoryBlobStore::new();

        let version = store.write_blob("ns/a", b"hello", None).await.unwrap();
        let blob = store.read_blob("ns/a").await.unwrap();

        assert_eq!(blob.content, b"hello");
        assert_eq!(blob.version, version);
    }

    #[tokio::test]
    async fn test_create_over_existing_conflicts() {
        let store = InMemoryBlobStore::new();
        store.write_blob("ns/a", b"one", None).await.unwrap();

        let result = store.write_blob("ns/a", b"two", None).await;
        assert!(matches!(result, Err(BlobStoreError::Conflict(_))));
        assert_eq!(store.read_blob("ns/a").await.unwrap().content, b"one");
    }

    #[tokio::test]
    async fn test_overwrite_requires_current_version() {
        let store = InMemoryBlobStore::new();
        let v1 = store.write_blob("ns/a", b"one", None).await.unwrap();
        let v2 = store.write_blob("ns/a", b"two", Some(&v1)).await.unwrap();
        assert_ne!(v1, v2);

        // v1 is now stale
        let stale = store.write_blob("ns/a", b"three", Some(&v1)).await;
        assert!(matches!(stale, Err(BlobStoreError::Conflict(_))));
        assert_eq!(store.read_blob("ns/a").await.unwrap().content, b"two");
    }

    #[tokio::test]
    async fn test_delete_with_stale_version_keeps_blob() {
        let store = InMemoryBlobStore::new();
        let v1 = store.write_blob("ns/a", b"one", None).await.unwrap();
        let v2 = store.write_blob("ns/a", b"two", Some(&v1)).await.unwrap();

        let result = store.delete_blob("ns/a", &v1).await;
        assert!(matches!(result, Err(BlobStoreError::Conflict(_))));
        assert!(store.read_blob("ns/a").await.is_ok());

        store.delete_blob("ns/a", &v2).await.unwrap();
        assert!(store.read_blob("ns/a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let store = InMemoryBlobStore::new();
        let result = store.delete_blob("ns/missing", "abc").await;
        assert!(matches!(result, Err(BlobStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_scopes_to_direct_children() {
        let store = InMemoryBlobStore::new();
        store.write_blob("ns/a", b"1", None).await.unwrap();
        store.write_blob("ns/b", b"2", None).await.unwrap();
        store.write_blob("ns/deeper/c", b"3", None).await.unwrap();
        store.write_blob("nsx/d", b"4", None).await.unwrap();

        let names: Vec<_> = store
            .list_blobs("ns")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["ns/a", "ns/b"]);
    }

    #[tokio::test]
    async fn test_list_missing_namespace_is_empty() {
        let store = InMemoryBlobStore::new();
        assert!(store.list_blobs("nothing-here").await.unwrap().is_empty());
    }
}
