//! # Record Store
//!
//! Composes the crypto codec with a [`BlobStore`].
//!
//! ## Invariants
//! - Only ciphertext envelopes are written to the backing store
//! - A blob name is fixed at creation
//! - Every overwrite/delete presents the version from the preceding read
//! - A failed write-back leaves no trace of the attempted transition

use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::backing_store::{BlobEntry, BlobStore, BlobStoreError};
use crate::crypto;
use crate::observability::Event;

use super::errors::{RecordError, RecordResult};
use super::naming::{blob_name, scope_blob_name, BLOB_EXTENSION};
use super::record::{Payload, Record};

/// Handle to a stored record: its blob name and current version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRef {
    pub name: String,
    pub version: String,
}

/// A decrypted record tagged with what an admin needs to mutate it later
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub blob_name: String,
    pub version: String,
}

/// Result of an approve call
#[derive(Debug, Clone)]
pub struct ApprovedRecord {
    pub record: Record,
    pub blob: RecordRef,
    /// `false` when the record was already approved and nothing was written
    pub newly_approved: bool,
}

/// Encrypted record store
#[derive(Debug)]
pub struct RecordStore {
    blobs: Arc<dyn BlobStore>,
    passphrase: SecretString,
    list_fan_out: usize,
}

impl RecordStore {
    /// Create a record store.
    ///
    /// `list_fan_out` bounds the concurrent blob reads issued while listing.
    pub fn new(blobs: Arc<dyn BlobStore>, passphrase: SecretString, list_fan_out: usize) -> Self {
        Self {
            blobs,
            passphrase,
            list_fan_out: list_fan_out.max(1),
        }
    }

    fn seal(&self, record: &Record) -> RecordResult<Vec<u8>> {
        let plaintext = record.to_plaintext()?;
        Ok(crypto::encrypt(&plaintext, self.passphrase.expose_secret()).into_bytes())
    }

    fn open(&self, name: &str, content: &[u8]) -> RecordResult<Record> {
        let envelope = std::str::from_utf8(content)
            .map_err(|_| RecordError::CorruptRecord(format!("{}: envelope is not text", name)))?;
        let plaintext = crypto::decrypt(envelope, self.passphrase.expose_secret())
            .map_err(|e| RecordError::CorruptRecord(format!("{}: {}", name, e)))?;
        Record::from_plaintext(&plaintext)
    }

    /// Encrypt and store a new pending record
    pub async fn create(
        &self,
        namespace: &str,
        identity: &str,
        payload: Payload,
    ) -> RecordResult<RecordRef> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(RecordError::Validation("identity is required".to_string()));
        }

        let now = Utc::now();
        let record = Record::new(identity, now, payload);
        let name = blob_name(namespace, identity, now);
        let content = self.seal(&record)?;

        let version = self.blobs.write_blob(&name, &content, None).await?;

        tracing::info!(event = Event::RecordCreated.as_str(), blob = %name, "record stored");
        Ok(RecordRef { name, version })
    }

    /// Read and decrypt every record in a namespace, newest first.
    ///
    /// Blobs that fail to decrypt or parse are skipped. Blobs deleted between
    /// the listing and the read are skipped too.
    pub async fn list_decrypted(&self, namespace: &str) -> RecordResult<Vec<ListedRecord>> {
        let entries: Vec<BlobEntry> = self
            .blobs
            .list_blobs(namespace)
            .await?
            .into_iter()
            .filter(|e| e.name.ends_with(BLOB_EXTENSION))
            .collect();

        let results: Vec<RecordResult<Option<ListedRecord>>> = stream::iter(entries)
            .map(|entry| self.read_listed(entry))
            .buffer_unordered(self.list_fan_out)
            .collect()
            .await;

        let mut records = Vec::with_capacity(results.len());
        for result in results {
            if let Some(listed) = result? {
                records.push(listed);
            }
        }

        records.sort_by(|a, b| b.record.submitted_at.cmp(&a.record.submitted_at));
        Ok(records)
    }

    async fn read_listed(&self, entry: BlobEntry) -> RecordResult<Option<ListedRecord>> {
        let blob = match self.blobs.read_blob(&entry.name).await {
            Ok(blob) => blob,
            Err(BlobStoreError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match self.open(&entry.name, &blob.content) {
            Ok(record) => Ok(Some(ListedRecord {
                record,
                blob_name: entry.name,
                version: blob.version,
            })),
            Err(e) => {
                tracing::warn!(
                    event = Event::RecordSkipped.as_str(),
                    blob = %entry.name,
                    error = %e,
                    "skipping unreadable record"
                );
                Ok(None)
            }
        }
    }

    /// Mark a record approved.
    ///
    /// When `expected_version` is given it must match the blob's current
    /// version. The write-back always carries the version just read, so a
    /// writer that lands in between makes this call fail with `Conflict`.
    /// Approving an approved record is a no-op.
    pub async fn approve(
        &self,
        namespace: &str,
        name: &str,
        expected_version: Option<&str>,
        approver: &str,
    ) -> RecordResult<ApprovedRecord> {
        let name = scope_blob_name(namespace, name)?;
        let blob = self.blobs.read_blob(&name).await?;

        if let Some(expected) = expected_version {
            if expected != blob.version {
                return Err(RecordError::Conflict(name));
            }
        }

        let mut record = self.open(&name, &blob.content)?;

        if !record.approve(approver, Utc::now()) {
            return Ok(ApprovedRecord {
                record,
                blob: RecordRef {
                    name,
                    version: blob.version,
                },
                newly_approved: false,
            });
        }

        let content = self.seal(&record)?;
        let version = self
            .blobs
            .write_blob(&name, &content, Some(&blob.version))
            .await?;

        tracing::info!(
            event = Event::RecordApproved.as_str(),
            blob = %name,
            approver,
            "record approved"
        );
        Ok(ApprovedRecord {
            record,
            blob: RecordRef { name, version },
            newly_approved: true,
        })
    }

    /// Delete a record at the given version
    pub async fn remove(
        &self,
        namespace: &str,
        name: &str,
        expected_version: &str,
    ) -> RecordResult<()> {
        let name = scope_blob_name(namespace, name)?;
        if expected_version.trim().is_empty() {
            return Err(RecordError::Validation("version is required".to_string()));
        }

        self.blobs.delete_blob(&name, expected_version).await?;

        tracing::info!(event = Event::RecordDeleted.as_str(), blob = %name, "record deleted");
        Ok(())
    }
}
