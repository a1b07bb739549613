//! # Backing Store Errors

use thiserror::Error;

/// Result type for backing store operations
pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

/// Backing store errors
#[derive(Debug, Clone, Error)]
pub enum BlobStoreError {
    /// Blob (or namespace) does not exist
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Version token is stale, missing for an existing blob, or the blob
    /// appeared concurrently
    #[error("Version conflict on blob: {0}")]
    Conflict(String),

    /// Remote API answered with an unexpected status
    #[error("Backing store returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Request never completed (connect failure, timeout, reset)
    #[error("Backing store unreachable: {0}")]
    Transport(String),

    /// Response body could not be interpreted
    #[error("Invalid backing store response: {0}")]
    InvalidResponse(String),
}

impl BlobStoreError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            BlobStoreError::NotFound(_) => 404,
            BlobStoreError::Conflict(_) => 409,
            BlobStoreError::Upstream { .. } => 502,
            BlobStoreError::Transport(_) => 502,
            BlobStoreError::InvalidResponse(_) => 502,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobStoreError::NotFound(_))
    }
}

impl From<reqwest::Error> for BlobStoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BlobStoreError::InvalidResponse(err.to_string())
        } else {
            BlobStoreError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(BlobStoreError::NotFound("a".into()).status_code(), 404);
        assert_eq!(BlobStoreError::Conflict("a".into()).status_code(), 409);
        assert_eq!(
            BlobStoreError::Upstream {
                status: 500,
                message: "boom".into()
            }
            .status_code(),
            502
        );
        assert_eq!(BlobStoreError::Transport("timeout".into()).status_code(), 502);
    }
}
