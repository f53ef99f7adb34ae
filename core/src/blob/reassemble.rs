//! Decode-side reassembly of split blobs.
//!
//! State machine: a map keyed by blob path. Entries are created lazily when
//! the first tagged part of a path arrives and removed the moment the last
//! part lands. Untagged (single-chunk) blobs bypass the map entirely. At
//! end of stream the map must be empty; leftovers mean the file lost parts.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::blob::header::BlobHeader;
use crate::error::BackupError;

/// A fully reassembled blob handed back to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlob {
    pub path: String,
    pub mime_type: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

struct PendingBlob {
    mime_type: String,
    declared_size: u64,
    total_parts: u32,
    // BTreeMap keeps parts sorted by index so assembly is a plain walk.
    parts: BTreeMap<u32, Vec<u8>>,
}

/// Part-map state machine; one per decode.
#[derive(Default)]
pub struct Reassembler {
    pending: HashMap<String, PendingBlob>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decrypted blob chunk. Returns a blob when it completes one.
    pub fn accept(
        &mut self,
        header: BlobHeader,
        bytes: Vec<u8>,
    ) -> Result<Option<DecodedBlob>, ReassemblyError> {
        match (header.part_index, header.total_parts) {
            (None, None) => {
                if bytes.len() as u64 != header.size {
                    return Err(ReassemblyError::SizeMismatch {
                        path: header.path,
                        declared: header.size,
                        actual: bytes.len() as u64,
                    });
                }
                Ok(Some(DecodedBlob {
                    path: header.path,
                    mime_type: header.mime_type,
                    size: header.size,
                    bytes,
                }))
            }
            (Some(index), Some(total)) => {
                self.accept_part(header.path, header.mime_type, header.size, index, total, bytes)
            }
            _ => Err(ReassemblyError::HalfTaggedHeader { path: header.path }),
        }
    }

    fn accept_part(
        &mut self,
        path: String,
        mime_type: String,
        size: u64,
        index: u32,
        total: u32,
        bytes: Vec<u8>,
    ) -> Result<Option<DecodedBlob>, ReassemblyError> {
        if total == 0 || index >= total {
            return Err(ReassemblyError::PartOutOfRange { path, index, total });
        }

        let entry = self.pending.entry(path.clone()).or_insert_with(|| PendingBlob {
            mime_type,
            declared_size: size,
            total_parts: total,
            parts: BTreeMap::new(),
        });

        if entry.total_parts != total || entry.declared_size != size {
            return Err(ReassemblyError::HeaderDrift { path });
        }
        if entry.parts.contains_key(&index) {
            return Err(ReassemblyError::DuplicatePart { path, index });
        }

        entry.parts.insert(index, bytes);
        if entry.parts.len() as u32 != entry.total_parts {
            return Ok(None);
        }

        // Last part arrived: assemble in index order and drop the map entry.
        let done = self.pending.remove(&path).unwrap();
        let mut assembled = Vec::with_capacity(done.declared_size as usize);
        for part in done.parts.into_values() {
            assembled.extend_from_slice(&part);
        }

        if assembled.len() as u64 != done.declared_size {
            return Err(ReassemblyError::SizeMismatch {
                path,
                declared: done.declared_size,
                actual: assembled.len() as u64,
            });
        }

        Ok(Some(DecodedBlob {
            path,
            mime_type: done.mime_type,
            size: done.declared_size,
            bytes: assembled,
        }))
    }

    /// Terminal check: paths still waiting for parts at end of stream.
    pub fn outstanding_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.pending.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[derive(Debug)]
pub enum ReassemblyError {
    /// Exactly one of partIndex/totalParts present.
    HalfTaggedHeader { path: String },

    /// partIndex outside 0..totalParts, or totalParts of zero.
    PartOutOfRange { path: String, index: u32, total: u32 },

    /// Parts of the same path disagree on totalParts or size.
    HeaderDrift { path: String },

    /// The same (path, partIndex) appeared twice.
    DuplicatePart { path: String, index: u32 },

    /// Assembled bytes do not match the declared size.
    SizeMismatch {
        path: String,
        declared: u64,
        actual: u64,
    },
}

impl fmt::Display for ReassemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ReassemblyError::*;
        match self {
            HalfTaggedHeader { path } => {
                write!(f, "blob {path:?}: partIndex and totalParts must appear together")
            }
            PartOutOfRange { path, index, total } => {
                write!(f, "blob {path:?}: part {index} out of range for {total} parts")
            }
            HeaderDrift { path } => {
                write!(f, "blob {path:?}: parts disagree on totalParts/size")
            }
            DuplicatePart { path, index } => {
                write!(f, "blob {path:?}: duplicate part {index}")
            }
            SizeMismatch {
                path,
                declared,
                actual,
            } => {
                write!(f, "blob {path:?}: declared size {declared}, assembled {actual}")
            }
        }
    }
}

impl std::error::Error for ReassemblyError {}

impl From<ReassemblyError> for BackupError {
    fn from(e: ReassemblyError) -> Self {
        match e {
            ReassemblyError::SizeMismatch {
                path,
                declared,
                actual,
            } => BackupError::DecodeSchema(format!(
                "blob {path:?}: declared size {declared}, assembled {actual}"
            )),
            ReassemblyError::HalfTaggedHeader { path } => BackupError::DecodeSchema(format!(
                "blob {path:?}: partIndex and totalParts must appear together"
            )),
            ReassemblyError::PartOutOfRange { path, index, total } => {
                BackupError::InvalidContainer(format!(
                    "blob {path:?}: part {index} out of range for {total} parts"
                ))
            }
            ReassemblyError::HeaderDrift { path } => BackupError::InvalidContainer(format!(
                "blob {path:?}: parts disagree on totalParts/size"
            )),
            ReassemblyError::DuplicatePart { path, index } => BackupError::InvalidContainer(
                format!("blob {path:?}: duplicate part {index}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part_header(path: &str, size: u64, index: u32, total: u32) -> BlobHeader {
        BlobHeader {
            path: path.into(),
            mime_type: "application/octet-stream".into(),
            size,
            part_index: Some(index),
            total_parts: Some(total),
        }
    }

    #[test]
    fn single_chunk_blob_bypasses_the_map() {
        let mut r = Reassembler::new();
        let header = BlobHeader::single("a.txt", "text/plain", 5);
        let blob = r.accept(header, b"hello".to_vec()).unwrap().unwrap();
        assert_eq!(blob.path, "a.txt");
        assert_eq!(blob.bytes, b"hello");
        assert!(r.is_empty());
    }

    #[test]
    fn parts_complete_in_order() {
        let mut r = Reassembler::new();
        assert!(r.accept(part_header("big", 6, 0, 2), b"abc".to_vec()).unwrap().is_none());
        assert!(!r.is_empty());
        let blob = r.accept(part_header("big", 6, 1, 2), b"def".to_vec()).unwrap().unwrap();
        assert_eq!(blob.bytes, b"abcdef");
        assert_eq!(blob.size, 6);
        assert!(r.is_empty());
    }

    #[test]
    fn parts_complete_out_of_order() {
        let mut r = Reassembler::new();
        assert!(r.accept(part_header("big", 9, 2, 3), b"ghi".to_vec()).unwrap().is_none());
        assert!(r.accept(part_header("big", 9, 0, 3), b"abc".to_vec()).unwrap().is_none());
        let blob = r.accept(part_header("big", 9, 1, 3), b"def".to_vec()).unwrap().unwrap();
        assert_eq!(blob.bytes, b"abcdefghi");
    }

    #[test]
    fn interleaved_blobs_do_not_cross() {
        let mut r = Reassembler::new();
        assert!(r.accept(part_header("x", 2, 0, 2), b"x".to_vec()).unwrap().is_none());
        assert!(r.accept(part_header("y", 2, 0, 2), b"y".to_vec()).unwrap().is_none());
        let x = r.accept(part_header("x", 2, 1, 2), b"X".to_vec()).unwrap().unwrap();
        assert_eq!(x.bytes, b"xX");
        let y = r.accept(part_header("y", 2, 1, 2), b"Y".to_vec()).unwrap().unwrap();
        assert_eq!(y.bytes, b"yY");
        assert!(r.is_empty());
    }

    #[test]
    fn outstanding_paths_are_reported_sorted() {
        let mut r = Reassembler::new();
        r.accept(part_header("zz", 2, 0, 2), b"z".to_vec()).unwrap();
        r.accept(part_header("aa", 2, 0, 2), b"a".to_vec()).unwrap();
        assert_eq!(r.outstanding_paths(), vec!["aa".to_string(), "zz".to_string()]);
    }

    #[test]
    fn duplicate_part_is_rejected() {
        let mut r = Reassembler::new();
        r.accept(part_header("p", 4, 0, 2), b"ab".to_vec()).unwrap();
        assert!(matches!(
            r.accept(part_header("p", 4, 0, 2), b"ab".to_vec()),
            Err(ReassemblyError::DuplicatePart { index: 0, .. })
        ));
    }

    #[test]
    fn half_tagged_header_is_rejected() {
        let mut r = Reassembler::new();
        let mut header = BlobHeader::single("h", "text/plain", 1);
        header.part_index = Some(0);
        assert!(matches!(
            r.accept(header, b"x".to_vec()),
            Err(ReassemblyError::HalfTaggedHeader { .. })
        ));
    }

    #[test]
    fn out_of_range_part_is_rejected() {
        let mut r = Reassembler::new();
        assert!(matches!(
            r.accept(part_header("p", 4, 2, 2), b"ab".to_vec()),
            Err(ReassemblyError::PartOutOfRange { index: 2, total: 2, .. })
        ));
        assert!(matches!(
            r.accept(part_header("q", 4, 0, 0), b"ab".to_vec()),
            Err(ReassemblyError::PartOutOfRange { total: 0, .. })
        ));
    }

    #[test]
    fn total_parts_drift_is_rejected() {
        let mut r = Reassembler::new();
        r.accept(part_header("p", 4, 0, 3), b"a".to_vec()).unwrap();
        assert!(matches!(
            r.accept(part_header("p", 4, 1, 2), b"b".to_vec()),
            Err(ReassemblyError::HeaderDrift { .. })
        ));
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let mut r = Reassembler::new();
        let header = BlobHeader::single("s", "text/plain", 10);
        assert!(matches!(
            r.accept(header, b"short".to_vec()),
            Err(ReassemblyError::SizeMismatch { declared: 10, actual: 5, .. })
        ));

        r.accept(part_header("m", 100, 0, 2), b"ab".to_vec()).unwrap();
        assert!(matches!(
            r.accept(part_header("m", 100, 1, 2), b"cd".to_vec()),
            Err(ReassemblyError::SizeMismatch { declared: 100, actual: 4, .. })
        ));
    }
}
