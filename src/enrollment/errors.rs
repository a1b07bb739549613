//! # Enrollment Errors

use thiserror::Error;

/// Result type for enrollment calls
pub type EnrollmentResult<T> = Result<T, EnrollmentError>;

#[derive(Debug, Clone, Error)]
pub enum EnrollmentError {
    /// Signing key could not be loaded
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    /// Service answered with a non-success status other than 409
    #[error("Enrollment rejected with status {status}")]
    Rejected { status: u16, body: String },

    #[error("Enrollment service unreachable: {0}")]
    Transport(String),
}

impl EnrollmentError {
    /// Raw response body of a rejection, for server-side logs only
    pub fn response_body(&self) -> Option<&str> {
        match self {
            EnrollmentError::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EnrollmentError {
    fn from(err: reqwest::Error) -> Self {
        EnrollmentError::Transport(err.to_string())
    }
}
