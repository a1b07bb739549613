//! AES-256-CBC envelope codec.
//!
//! ## Invariants
//! - Every `encrypt` call draws a fresh random IV from the OS RNG
//! - Key derivation is a pure function of the passphrase

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use super::errors::{CryptoError, CryptoResult};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// IV length in bytes (one AES block)
pub const IV_LENGTH: usize = 16;

/// AES-256 key length in bytes
pub const KEY_LENGTH: usize = 32;

const BLOCK_SIZE: usize = 16;

/// Derive the symmetric key for a passphrase.
///
/// The key is the first 32 characters of the standard base64 rendering of
/// `sha256(passphrase)`, taken as ASCII bytes. Envelopes already sitting in
/// the data repository were sealed with exactly this derivation.
pub fn derive_key(passphrase: &str) -> [u8; KEY_LENGTH] {
    let digest = Sha256::digest(passphrase.as_bytes());
    let encoded = base64::engine::general_purpose::STANDARD.encode(digest);

    // base64 of 32 bytes is 44 chars, so the slice is always full
    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&encoded.as_bytes()[..KEY_LENGTH]);
    key
}

/// Encrypt `plaintext` into a hex envelope `IV || ciphertext`.
pub fn encrypt(plaintext: &str, passphrase: &str) -> String {
    let key = derive_key(passphrase);

    let mut iv = [0u8; IV_LENGTH];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut envelope = String::with_capacity((IV_LENGTH + ciphertext.len()) * 2);
    envelope.push_str(&hex::encode(iv));
    envelope.push_str(&hex::encode(ciphertext));
    envelope
}

/// Decrypt a hex envelope produced by [`encrypt`].
pub fn decrypt(envelope: &str, passphrase: &str) -> CryptoResult<String> {
    let envelope = envelope.trim();
    let bytes = hex::decode(envelope).map_err(|_| CryptoError::MalformedEnvelope("not hex"))?;

    if bytes.len() < IV_LENGTH + BLOCK_SIZE {
        return Err(CryptoError::MalformedEnvelope("truncated"));
    }

    let (iv, ciphertext) = bytes.split_at(IV_LENGTH);
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::MalformedEnvelope("ciphertext not block aligned"));
    }

    let mut iv_block = [0u8; IV_LENGTH];
    iv_block.copy_from_slice(iv);
    let key = derive_key(passphrase);

    let plaintext = Aes256CbcDec::new(&key.into(), &iv_block.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::DecryptFailed)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidPlaintext)
}
