//! Per-chunk pipeline: gzip, then AES-256-GCM, then framing.
//!
//! Design notes:
//! - Order is fixed by the format: compression always runs on plaintext,
//!   encryption on the compressed bytes. The reverse path decrypts first
//!   and only then inflates.
//! - Each sealed chunk gets a fresh random nonce; the nonce travels in the
//!   chunk header, not in the payload.
//! - This module reports `PipelineError`; the decoder translates
//!   `AuthFailed` into `InvalidPassword` or `Corrupt` depending on whether
//!   the key has already opened an earlier chunk.

use thiserror::Error;

use crate::compression::{self, GzipError};
use crate::container::framing::{write_chunk, ChunkHeader, ChunkType};
use crate::crypto::{self, CryptoError, DerivedKey};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// GCM tag check failed: wrong key or damaged ciphertext.
    #[error("chunk authentication failed")]
    AuthFailed,

    /// Decompression failed on a chunk that decrypted cleanly.
    #[error("chunk decompression failed: {0}")]
    BadDeflate(String),

    /// Seal-side failure (key setup, compression of outgoing data).
    #[error("chunk seal failed: {0}")]
    Seal(String),
}

/// Compress and encrypt `plaintext`, appending one framed chunk to `out`.
pub fn seal_chunk(
    out: &mut Vec<u8>,
    chunk_type: ChunkType,
    plaintext: &[u8],
    key: &DerivedKey,
) -> Result<(), PipelineError> {
    let compressed =
        compression::compress(plaintext).map_err(|e| PipelineError::Seal(e.to_string()))?;

    let nonce = crypto::generate_nonce();
    let ciphertext = crypto::seal(&compressed, key, &nonce)
        .map_err(|e| PipelineError::Seal(e.to_string()))?;

    write_chunk(out, chunk_type, &nonce, &ciphertext);
    Ok(())
}

/// Decrypt and decompress one chunk payload read off the wire.
pub fn open_chunk(
    header: &ChunkHeader,
    payload: &[u8],
    key: &DerivedKey,
) -> Result<Vec<u8>, PipelineError> {
    let compressed = crypto::open(payload, key, &header.nonce).map_err(|e| match e {
        CryptoError::TagMismatch | CryptoError::CiphertextTooShort { .. } => {
            PipelineError::AuthFailed
        }
        other => PipelineError::Seal(other.to_string()),
    })?;

    compression::decompress(&compressed).map_err(|e| match e {
        GzipError::Decompress(msg) | GzipError::Compress(msg) => PipelineError::BadDeflate(msg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::framing::read_chunk;
    use crate::constants::{CHUNK_HEADER_LEN, TAG_LEN};
    use crate::crypto::derive_key;

    fn key() -> DerivedKey {
        derive_key("pipeline-tests", &[0x5A; 16])
    }

    fn seal_one(chunk_type: ChunkType, plaintext: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        seal_chunk(&mut out, chunk_type, plaintext, &key()).unwrap();
        out
    }

    #[test]
    fn seal_open_round_trip() {
        let wire = seal_one(ChunkType::Manifest, b"{\"hello\":\"world\"}");
        let (header, payload, _) = read_chunk(&wire, 0).unwrap();
        assert_eq!(header.chunk_type, ChunkType::Manifest);
        let plain = open_chunk(&header, payload, &key()).unwrap();
        assert_eq!(plain, b"{\"hello\":\"world\"}");
    }

    #[test]
    fn payload_len_matches_frame() {
        let wire = seal_one(ChunkType::Blob, &[7u8; 1000]);
        let (header, payload, _) = read_chunk(&wire, 0).unwrap();
        assert_eq!(header.payload_len as usize, payload.len());
        assert_eq!(wire.len(), CHUNK_HEADER_LEN + payload.len());
        // Ciphertext carries at least the GCM tag on top of the deflate body.
        assert!(payload.len() > TAG_LEN);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let wire = seal_one(ChunkType::Database, b"");
        let (header, payload, _) = read_chunk(&wire, 0).unwrap();
        assert_eq!(open_chunk(&header, payload, &key()).unwrap(), b"");
    }

    #[test]
    fn wrong_key_is_auth_failure() {
        let wire = seal_one(ChunkType::Manifest, b"secret");
        let (header, payload, _) = read_chunk(&wire, 0).unwrap();
        let other = derive_key("different-password", &[0x5A; 16]);
        assert!(matches!(
            open_chunk(&header, payload, &other),
            Err(PipelineError::AuthFailed)
        ));
    }

    #[test]
    fn tampered_ciphertext_is_auth_failure() {
        let mut wire = seal_one(ChunkType::Manifest, b"secret");
        let last = wire.len() - 1;
        wire[last] ^= 0x01; // flip a tag bit
        let (header, payload, _) = read_chunk(&wire, 0).unwrap();
        assert!(matches!(
            open_chunk(&header, payload, &key()),
            Err(PipelineError::AuthFailed)
        ));
    }

    #[test]
    fn tampered_nonce_is_auth_failure() {
        let mut wire = seal_one(ChunkType::Manifest, b"secret");
        wire[8] ^= 0xFF; // first nonce byte
        let (header, payload, _) = read_chunk(&wire, 0).unwrap();
        assert!(matches!(
            open_chunk(&header, payload, &key()),
            Err(PipelineError::AuthFailed)
        ));
    }

    #[test]
    fn nonces_are_fresh_per_chunk() {
        let mut out = Vec::new();
        seal_chunk(&mut out, ChunkType::Blob, b"same plaintext", &key()).unwrap();
        seal_chunk(&mut out, ChunkType::Blob, b"same plaintext", &key()).unwrap();
        let (first, _, next) = read_chunk(&out, 0).unwrap();
        let (second, _, _) = read_chunk(&out, next).unwrap();
        assert_ne!(first.nonce, second.nonce);
    }
}
