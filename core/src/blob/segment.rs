//! Blob splitter: bounds every part at 10 MiB of raw bytes.
//!
//! A blob at or under the cap becomes exactly one chunk whose header omits
//! `partIndex`/`totalParts`. Anything larger becomes `ceil(size / cap)`
//! parts, every part tagged with both fields, emitted in ascending index
//! order. The decoder tolerates any part order; emitting in order keeps the
//! output deterministic.

use crate::blob::header::BlobHeader;
use crate::constants::MAX_BLOB_PART_SIZE;

/// One outgoing part: its in-payload header plus a borrowed byte window.
#[derive(Debug, Clone)]
pub struct BlobPart<'a> {
    pub header: BlobHeader,
    pub bytes: &'a [u8],
}

/// Number of chunks a blob of `size` bytes will occupy.
pub fn part_count(size: u64) -> u64 {
    if size <= MAX_BLOB_PART_SIZE as u64 {
        1
    } else {
        size.div_ceil(MAX_BLOB_PART_SIZE as u64)
    }
}

/// Split `bytes` into ordered parts for `path`/`mime_type`.
pub fn segment_blob<'a>(path: &str, mime_type: &str, bytes: &'a [u8]) -> Vec<BlobPart<'a>> {
    let size = bytes.len() as u64;

    if bytes.len() <= MAX_BLOB_PART_SIZE {
        return vec![BlobPart {
            header: BlobHeader::single(path, mime_type, size),
            bytes,
        }];
    }

    let total = part_count(size) as u32;
    bytes
        .chunks(MAX_BLOB_PART_SIZE)
        .enumerate()
        .map(|(index, window)| BlobPart {
            header: BlobHeader {
                path: path.to_string(),
                mime_type: mime_type.to_string(),
                size,
                part_index: Some(index as u32),
                total_parts: Some(total),
            },
            bytes: window,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_blob_is_one_untagged_part() {
        let parts = segment_blob("a.txt", "text/plain", b"hello");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].header.part_index, None);
        assert_eq!(parts[0].header.total_parts, None);
        assert_eq!(parts[0].header.size, 5);
        assert_eq!(parts[0].bytes, b"hello");
    }

    #[test]
    fn empty_blob_is_one_part() {
        let parts = segment_blob("empty", "application/octet-stream", b"");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].header.size, 0);
        assert!(parts[0].bytes.is_empty());
    }

    #[test]
    fn blob_exactly_at_cap_stays_single() {
        let data = vec![0u8; MAX_BLOB_PART_SIZE];
        let parts = segment_blob("cap", "application/octet-stream", &data);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].header.part_index, None);
    }

    #[test]
    fn one_byte_over_cap_splits_in_two() {
        let data = vec![7u8; MAX_BLOB_PART_SIZE + 1];
        let parts = segment_blob("big", "application/octet-stream", &data);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].header.part_index, Some(0));
        assert_eq!(parts[0].header.total_parts, Some(2));
        assert_eq!(parts[0].bytes.len(), MAX_BLOB_PART_SIZE);
        assert_eq!(parts[1].header.part_index, Some(1));
        assert_eq!(parts[1].header.total_parts, Some(2));
        assert_eq!(parts[1].bytes.len(), 1);
        // Every part declares the full blob size, not the part size.
        assert!(parts.iter().all(|p| p.header.size == data.len() as u64));
    }

    #[test]
    fn part_count_matches_ceil_division() {
        let cap = MAX_BLOB_PART_SIZE as u64;
        assert_eq!(part_count(0), 1);
        assert_eq!(part_count(cap), 1);
        assert_eq!(part_count(cap + 1), 2);
        assert_eq!(part_count(3 * cap), 3);
        assert_eq!(part_count(3 * cap + 999), 4);
    }

    #[test]
    fn split_parts_concatenate_back() {
        let data: Vec<u8> = (0..(MAX_BLOB_PART_SIZE + 1000))
            .map(|i| (i % 256) as u8)
            .collect();
        let parts = segment_blob("seq", "application/octet-stream", &data);
        let joined: Vec<u8> = parts.iter().flat_map(|p| p.bytes.iter().copied()).collect();
        assert_eq!(joined, data);
    }
}
