//! # Credential Digests
//!
//! Admin passwords are configured as lowercase hex SHA-256 digests.
//!
//! ## Invariants
//! - Plain passwords are never stored or logged
//! - Digest comparison is constant-time

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of a hex SHA-256 digest
pub const DIGEST_HEX_LENGTH: usize = 64;

/// Hash a password into the configured digest format
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Whether `candidate` looks like a digest produced by [`hash_password`]
pub fn is_digest(candidate: &str) -> bool {
    candidate.len() == DIGEST_HEX_LENGTH && candidate.chars().all(|c| c.is_ascii_hexdigit())
}

/// Constant-time comparison of two byte slices
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Constant-time comparison of two strings
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}
