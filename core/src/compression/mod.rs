//! Lossless gzip codec applied to every chunk's plaintext.
//!
//! Design notes:
//! - Compression runs before encryption, never after; ciphertext does not
//!   compress.
//! - The payload is a bare gzip stream (deflate inside the gzip wrapper),
//!   no private length prefix or trailing checksum: gzip already carries
//!   CRC32 and ISIZE in its own trailer.
//! - Empty input must round-trip; truncated or corrupt input must fail with
//!   a codec error distinct from crypto failures.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GzipError {
    #[error("gzip compression failed: {0}")]
    Compress(String),

    /// Covers truncated streams, bad CRC trailers, and garbage input.
    #[error("gzip decompression failed: {0}")]
    Decompress(String),
}

/// Compress `bytes` into a gzip stream at the default level.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>, GzipError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| GzipError::Compress(e.to_string()))?;
    encoder.finish().map_err(|e| GzipError::Compress(e.to_string()))
}

/// Decompress a gzip stream produced by [`compress`].
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, GzipError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| GzipError::Decompress(e.to_string()))?;
    Ok(out)
}
