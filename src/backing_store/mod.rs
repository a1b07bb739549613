//! # Backing Store
//!
//! Content-versioned blob storage with optimistic concurrency.
//!
//! Every read returns a version token (a content hash). Overwrites and
//! deletes must present the token from the most recent read; the store
//! rejects stale tokens with [`BlobStoreError::Conflict`] instead of
//! clobbering a concurrent writer.
//!
//! No retries happen at this layer. Network failures and timeouts surface
//! as errors for the caller to act on.

pub mod backend;
pub mod errors;
pub mod github;
pub mod memory;

pub use backend::{BlobEntry, BlobStore, StoredBlob};
pub use errors::{BlobStoreError, BlobStoreResult};
pub use github::{GitHubContentsStore, GitHubStoreConfig};
pub use memory::InMemoryBlobStore;
