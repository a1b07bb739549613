//! # Crypto Codec
//!
//! Symmetric encryption of record payloads at rest.
//!
//! Envelopes are `hex(IV || ciphertext)` produced with AES-256-CBC and a key
//! derived from the configured passphrase. Derivation carries no salt, so any
//! process holding the same passphrase can open any envelope.

pub mod codec;
pub mod errors;

pub use codec::{decrypt, derive_key, encrypt, IV_LENGTH, KEY_LENGTH};
pub use errors::{CryptoError, CryptoResult};
