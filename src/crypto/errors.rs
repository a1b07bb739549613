//! # Crypto Errors

use thiserror::Error;

/// Result type for codec operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Codec errors
///
/// Messages stay generic so a failed decrypt never tells a caller whether
/// the envelope or the passphrase was at fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Envelope is not hex, too short, or not block aligned
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    /// Padding check failed (wrong passphrase or tampered ciphertext)
    #[error("Decryption failed")]
    DecryptFailed,

    /// Decrypted bytes are not UTF-8
    #[error("Decrypted payload is not valid UTF-8")]
    InvalidPlaintext,
}
