//! Blob-header micro-format inside a decrypted blob chunk.
//!
//! Layout:
//!
//! ```text
//! [ UTF-8 JSON header {path, mimeType, size, partIndex?, totalParts?} ]
//! [ 0x00 separator ]
//! [ raw part bytes ]
//! ```
//!
//! The separator is unambiguous: serde_json never emits a raw NUL byte
//! (control characters are escaped inside JSON strings), so the first 0x00
//! always terminates the header.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::BLOB_HEADER_SEPARATOR;

/// In-payload header carried by every blob chunk.
///
/// `part_index`/`total_parts` are absent for single-chunk blobs and both
/// present on every part of a split blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobHeader {
    pub path: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_parts: Option<u32>,
}

impl BlobHeader {
    pub fn single(path: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            size,
            part_index: None,
            total_parts: None,
        }
    }
}

/// Serialize one blob chunk plaintext: header JSON, separator, part bytes.
pub fn encode_blob_payload(header: &BlobHeader, part: &[u8]) -> Result<Vec<u8>, BlobHeaderError> {
    let json = serde_json::to_vec(header).map_err(|e| BlobHeaderError::BadJson(e.to_string()))?;
    let mut out = Vec::with_capacity(json.len() + 1 + part.len());
    out.extend_from_slice(&json);
    out.push(BLOB_HEADER_SEPARATOR);
    out.extend_from_slice(part);
    Ok(out)
}

/// Split one blob chunk plaintext back into its header and part bytes.
pub fn decode_blob_payload(payload: &[u8]) -> Result<(BlobHeader, &[u8]), BlobHeaderError> {
    let sep = payload
        .iter()
        .position(|&b| b == BLOB_HEADER_SEPARATOR)
        .ok_or(BlobHeaderError::MissingSeparator)?;

    let header: BlobHeader = serde_json::from_slice(&payload[..sep])
        .map_err(|e| BlobHeaderError::BadJson(e.to_string()))?;

    Ok((header, &payload[sep + 1..]))
}

#[derive(Debug)]
pub enum BlobHeaderError {
    /// No 0x00 separator anywhere in the chunk plaintext.
    MissingSeparator,

    /// Header JSON failed to parse or serialize.
    BadJson(String),
}

impl fmt::Display for BlobHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobHeaderError::MissingSeparator => {
                write!(f, "blob chunk is missing the header separator")
            }
            BlobHeaderError::BadJson(msg) => write!(f, "blob header JSON: {}", msg),
        }
    }
}

impl std::error::Error for BlobHeaderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trip() {
        let header = BlobHeader::single("photos/cat.jpg", "image/jpeg", 3);
        let payload = encode_blob_payload(&header, &[1, 2, 3]).unwrap();
        let (decoded, part) = decode_blob_payload(&payload).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(part, &[1, 2, 3]);
    }

    #[test]
    fn part_fields_serialize_only_when_present() {
        let single = BlobHeader::single("a.txt", "text/plain", 1);
        let json = serde_json::to_string(&single).unwrap();
        assert!(!json.contains("partIndex"));
        assert!(!json.contains("totalParts"));

        let part = BlobHeader {
            part_index: Some(0),
            total_parts: Some(2),
            ..single
        };
        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains("\"partIndex\":0"));
        assert!(json.contains("\"totalParts\":2"));
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let json =
            serde_json::to_string(&BlobHeader::single("a.bin", "application/octet-stream", 9))
                .unwrap();
        assert!(json.contains("\"mimeType\""));
        assert!(json.contains("\"path\""));
        assert!(json.contains("\"size\":9"));
    }

    #[test]
    fn part_bytes_may_contain_nul() {
        let header = BlobHeader::single("bin", "application/octet-stream", 5);
        let payload = encode_blob_payload(&header, &[0, 0, 1, 0, 2]).unwrap();
        let (_, part) = decode_blob_payload(&payload).unwrap();
        assert_eq!(part, &[0, 0, 1, 0, 2]);
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(matches!(
            decode_blob_payload(b"{\"path\":\"x\"}"),
            Err(BlobHeaderError::MissingSeparator)
        ));
    }

    #[test]
    fn bad_header_json_is_rejected() {
        assert!(matches!(
            decode_blob_payload(b"not-json\x00bytes"),
            Err(BlobHeaderError::BadJson(_))
        ));
    }
}
