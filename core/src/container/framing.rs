//! Chunk framing: the fixed 20-byte chunk header and chunk iteration.
//!
//! Design notes:
//! - All multi-byte fields little-endian; reserved bytes zero on write.
//! - `payload_len` counts the encrypted payload only (tag included, header
//!   and nonce excluded).
//! - Reads are bounds-checked against the remaining buffer so a declared
//!   length can never run past EOF; that surfaces as `Truncated`, not a
//!   panic or a short read.

use byteorder::{LittleEndian, WriteBytesExt};
use num_enum::TryFromPrimitive;
use std::fmt;

use crate::constants::{chunk_type_ids, CHUNK_HEADER_LEN, NONCE_LEN};

/// Chunk type tag at offset +4 of each chunk header.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum ChunkType {
    Manifest = chunk_type_ids::MANIFEST,
    Database = chunk_type_ids::DATABASE,
    Blob = chunk_type_ids::BLOB,
}

impl ChunkType {
    pub fn try_from_u8(v: u8) -> Result<Self, FrameError> {
        Self::try_from_primitive(v).map_err(|_| FrameError::UnknownChunkType { raw: v })
    }
}

/// Parsed view of one chunk header.
///
/// ```text
/// +0      4     payload_len (u32 LE, ciphertext bytes incl. tag)
/// +4      1     chunk_type  (0=manifest, 1=database, 2=blob)
/// +5      3     reserved (zero)
/// +8      12    nonce (random, unique per chunk)
/// +20     N     ciphertext
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub payload_len: u32,
    pub chunk_type: ChunkType,
    pub nonce: [u8; NONCE_LEN],
}

/// Append one framed chunk (header + ciphertext) to `out`.
pub fn write_chunk(
    out: &mut Vec<u8>,
    chunk_type: ChunkType,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) {
    out.reserve(CHUNK_HEADER_LEN + ciphertext.len());
    // Vec<u8> writes cannot fail.
    out.write_u32::<LittleEndian>(ciphertext.len() as u32).unwrap();
    out.push(chunk_type as u8);
    out.extend_from_slice(&[0u8; 3]);
    out.extend_from_slice(nonce);
    out.extend_from_slice(ciphertext);
}

/// Parse the chunk header at `buf[offset..]` without touching the payload.
pub fn decode_chunk_header(buf: &[u8], offset: usize) -> Result<ChunkHeader, FrameError> {
    let remaining = buf.len().saturating_sub(offset);
    if remaining < CHUNK_HEADER_LEN {
        return Err(FrameError::Truncated {
            offset,
            have: remaining,
            need: CHUNK_HEADER_LEN,
        });
    }

    let h = &buf[offset..offset + CHUNK_HEADER_LEN];
    let payload_len = u32::from_le_bytes(h[0..4].try_into().unwrap());
    let chunk_type = ChunkType::try_from_u8(h[4])?;
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&h[8..20]);

    Ok(ChunkHeader {
        payload_len,
        chunk_type,
        nonce,
    })
}

/// Parse one full chunk at `buf[offset..]`, returning its header, a borrowed
/// payload slice, and the offset of the next chunk.
pub fn read_chunk(buf: &[u8], offset: usize) -> Result<(ChunkHeader, &[u8], usize), FrameError> {
    let header = decode_chunk_header(buf, offset)?;
    let body_start = offset + CHUNK_HEADER_LEN;
    let body_end = body_start + header.payload_len as usize;

    if body_end > buf.len() {
        return Err(FrameError::Truncated {
            offset: body_start,
            have: buf.len() - body_start,
            need: header.payload_len as usize,
        });
    }

    Ok((header, &buf[body_start..body_end], body_end))
}

/// Walk every chunk header once without decrypting, returning the chunk
/// count. Fails fast on the first truncated header or overrunning payload.
pub fn scan_chunks(buf: &[u8], start: usize) -> Result<usize, FrameError> {
    let mut offset = start;
    let mut count = 0usize;
    while offset < buf.len() {
        let (_, _, next) = read_chunk(buf, offset)?;
        offset = next;
        count += 1;
    }
    Ok(count)
}

#[derive(Debug)]
pub enum FrameError {
    /// A chunk header or its declared payload straddles EOF.
    Truncated {
        offset: usize,
        have: usize,
        need: usize,
    },

    /// Type byte outside the defined registry.
    UnknownChunkType { raw: u8 },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Truncated { offset, have, need } => {
                write!(
                    f,
                    "truncated chunk at offset {}: {} bytes available, {} needed",
                    offset, have, need
                )
            }
            FrameError::UnknownChunkType { raw } => {
                write!(f, "unknown chunk type: {}", raw)
            }
        }
    }
}

impl std::error::Error for FrameError {}
