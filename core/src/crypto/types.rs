//! Crypto error type shared by the kdf and aead modules.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Nonce length mismatch (must be 12 bytes for AES-256-GCM).
    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLen { expected: usize, actual: usize },

    /// AEAD tag mismatch: wrong key, flipped ciphertext bit, or a modified
    /// tag. The decoder maps this to `InvalidPassword` or `Corrupt`
    /// depending on chunk position.
    #[error("AEAD tag mismatch")]
    TagMismatch,

    /// Ciphertext shorter than one tag; cannot possibly authenticate.
    #[error("ciphertext too short: {have} < {need}")]
    CiphertextTooShort { have: usize, need: usize },

    /// Key setup or derivation failure with context.
    #[error("crypto failure: {0}")]
    Failure(String),
}
