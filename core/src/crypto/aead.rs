//! AEAD seal/open for AES-256-GCM.
//!
//! Design notes:
//! - 32-byte key, 12-byte nonce, 16-byte tag appended to the ciphertext
//!   (total expansion: +16 bytes).
//! - Tag verification fails closed: no partial plaintext ever escapes.
//! - The caller supplies the nonce; this module never invents one, so the
//!   wire nonce and the sealing nonce cannot drift apart.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::constants::{NONCE_LEN, TAG_LEN};
use crate::crypto::kdf::DerivedKey;
use crate::crypto::types::CryptoError;

/// Encrypt `plaintext` under `key` with the given per-chunk nonce.
pub fn seal(plaintext: &[u8], key: &DerivedKey, nonce: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::InvalidNonceLen {
            expected: NONCE_LEN,
            actual: nonce.len(),
        });
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::Failure("AES-256-GCM key setup failed".into()))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Failure("AES-256-GCM seal failed".into()))
}

/// Decrypt `ciphertext_and_tag` and verify its GCM tag.
///
/// Any tag mismatch, wrong key, or modified ciphertext yields
/// `CryptoError::TagMismatch`; the decoder decides whether that means
/// `InvalidPassword` or `Corrupt`.
pub fn open(
    ciphertext_and_tag: &[u8],
    key: &DerivedKey,
    nonce: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::InvalidNonceLen {
            expected: NONCE_LEN,
            actual: nonce.len(),
        });
    }

    if ciphertext_and_tag.len() < TAG_LEN {
        return Err(CryptoError::CiphertextTooShort {
            have: ciphertext_and_tag.len(),
            need: TAG_LEN,
        });
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::Failure("AES-256-GCM key setup failed".into()))?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext_and_tag)
        .map_err(|_| CryptoError::TagMismatch)
}
