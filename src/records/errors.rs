//! # Record Store Errors

use thiserror::Error;

use crate::backing_store::BlobStoreError;

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Record store errors
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    /// Input rejected before touching the backing store
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// Version token is stale; re-read and retry
    #[error("Record was modified concurrently: {0}")]
    Conflict(String),

    /// Existing blob could not be decrypted or parsed
    #[error("Record is corrupt: {0}")]
    CorruptRecord(String),

    #[error(transparent)]
    BackingStore(BlobStoreError),
}

impl RecordError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            RecordError::Validation(_) => 400,
            RecordError::NotFound(_) => 404,
            RecordError::Conflict(_) => 409,
            RecordError::CorruptRecord(_) => 422,
            RecordError::BackingStore(e) => e.status_code(),
        }
    }

    /// Machine-checkable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::Validation(_) => "validation",
            RecordError::NotFound(_) => "not_found",
            RecordError::Conflict(_) => "conflict",
            RecordError::CorruptRecord(_) => "corrupt_record",
            RecordError::BackingStore(_) => "backing_store",
        }
    }
}

impl From<BlobStoreError> for RecordError {
    fn from(err: BlobStoreError) -> Self {
        match err {
            BlobStoreError::NotFound(name) => RecordError::NotFound(name),
            BlobStoreError::Conflict(name) => RecordError::Conflict(name),
            other => RecordError::BackingStore(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_classified() {
        let not_found: RecordError = BlobStoreError::NotFound("a".into()).into();
        assert_eq!(not_found.kind(), "not_found");

        let conflict: RecordError = BlobStoreError::Conflict("a".into()).into();
        assert_eq!(conflict.status_code(), 409);

        let transport: RecordError = BlobStoreError::Transport("timed out".into()).into();
        assert_eq!(transport.kind(), "backing_store");
        assert_eq!(transport.status_code(), 502);
    }
}
