//! # Blob Store Trait

use async_trait::async_trait;

use super::errors::BlobStoreResult;

/// Blob content plus the version token it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content: Vec<u8>,
    pub version: String,
}

/// Listing entry for a blob under a namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    /// Full blob name, including the namespace prefix
    pub name: String,
    pub version: String,
}

/// Content-versioned blob storage
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Read a blob and its current version
    async fn read_blob(&self, name: &str) -> BlobStoreResult<StoredBlob>;

    /// Create a blob (`expected_version == None`) or overwrite it.
    ///
    /// Overwrites must carry the current version; returns the new version.
    async fn write_blob(
        &self,
        name: &str,
        content: &[u8],
        expected_version: Option<&str>,
    ) -> BlobStoreResult<String>;

    /// Delete a blob at the given version
    async fn delete_blob(&self, name: &str, expected_version: &str) -> BlobStoreResult<()>;

    /// List blobs directly under `prefix`. A missing namespace is empty.
    async fn list_blobs(&self, prefix: &str) -> BlobStoreResult<Vec<BlobEntry>>;
}
