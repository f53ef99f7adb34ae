//! Encoder orchestrator: snapshot values in, one container buffer out.
//!
//! Ordering is part of the format: header, then exactly one manifest chunk,
//! one database chunk, and the blob chunks in caller-supplied order with
//! parts ascending. A fresh salt (and therefore a fresh key) is generated
//! per encode; the key is dropped before this function returns.

use tracing::{debug, warn};

use crate::blob::segment::{part_count, segment_blob};
use crate::blob::header::encode_blob_payload;
use crate::constants::{CHUNK_HEADER_LEN, HEADER_LEN, TAG_LEN};
use crate::container::framing::ChunkType;
use crate::container::header::FileHeader;
use crate::crypto::{derive_key, generate_salt};
use crate::error::BackupError;
use crate::pipeline::seal_chunk;
use crate::progress::{emit, Phase, ProgressSink};
use crate::snapshot::types::{DatabaseSnapshot, Manifest};

/// One blob scheduled for inclusion, as enumerated from the files table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSpec {
    pub path: String,
    pub mime_type: String,
    pub size: u64,
}

/// Encode a full container into memory.
///
/// `read_blob` is called once per blob, in order; its bytes are segmented,
/// sealed, and released before the next blob is read, so peak memory stays
/// bounded by one blob plus one part.
pub fn encode_backup(
    password: &str,
    manifest: &Manifest,
    database: &DatabaseSnapshot,
    blobs: &[BlobSpec],
    mut read_blob: impl FnMut(&str) -> anyhow::Result<Vec<u8>>,
    mut progress: Option<&mut dyn ProgressSink>,
) -> Result<Vec<u8>, BackupError> {
    let salt = generate_salt();
    let key = derive_key(password, &salt);

    // Progress totals use the enumerated sizes; segmentation below uses the
    // bytes actually read.
    let total_chunks = 2 + blobs
        .iter()
        .map(|b| part_count(b.size) as usize)
        .sum::<usize>();

    let mut out = Vec::with_capacity(HEADER_LEN);
    out.extend_from_slice(&FileHeader::new(salt).encode());

    if !emit(&mut progress, Phase::Preparing, 0, total_chunks, None) {
        return Err(BackupError::Cancelled);
    }

    let manifest_json = serde_json::to_vec(manifest)?;
    seal_chunk(&mut out, ChunkType::Manifest, &manifest_json, &key)
        .map_err(|e| BackupError::Io(e.to_string()))?;
    debug!(bytes = manifest_json.len(), "sealed manifest chunk");

    if !emit(&mut progress, Phase::Preparing, 1, total_chunks, None) {
        return Err(BackupError::Cancelled);
    }

    let database_json = serde_json::to_vec(database)?;
    seal_chunk(&mut out, ChunkType::Database, &database_json, &key)
        .map_err(|e| BackupError::Io(e.to_string()))?;
    debug!(bytes = database_json.len(), "sealed database chunk");

    if !emit(&mut progress, Phase::Database, 2, total_chunks, None) {
        return Err(BackupError::Cancelled);
    }

    let mut chunks_done = 2usize;
    for blob in blobs {
        let bytes = read_blob(&blob.path).map_err(BackupError::from_port)?;
        if bytes.len() as u64 != blob.size {
            warn!(
                path = %blob.path,
                declared = blob.size,
                actual = bytes.len(),
                "blob size changed since enumeration"
            );
        }

        let parts = segment_blob(&blob.path, &blob.mime_type, &bytes);
        debug!(path = %blob.path, parts = parts.len(), "sealing blob");
        for part in &parts {
            let payload = encode_blob_payload(&part.header, part.bytes)
                .map_err(|e| BackupError::DecodeSchema(e.to_string()))?;
            seal_chunk(&mut out, ChunkType::Blob, &payload, &key)
                .map_err(|e| BackupError::Io(e.to_string()))?;
            chunks_done += 1;
        }

        if !emit(
            &mut progress,
            Phase::Blobs,
            chunks_done,
            total_chunks,
            Some(&blob.path),
        ) {
            return Err(BackupError::Cancelled);
        }
    }

    if !emit(
        &mut progress,
        Phase::Finalizing,
        chunks_done,
        total_chunks,
        None,
    ) {
        return Err(BackupError::Cancelled);
    }

    debug!(chunks = chunks_done, bytes = out.len(), "container sealed");
    Ok(out)
}

/// Conservative pre-encode size bound for UI free-space checks.
///
/// JSON payloads are assumed to compress to ~30%; blob bytes are counted
/// uncompressed. Accuracy is best-effort, not contractual.
pub fn estimate_backup_size(
    manifest: &Manifest,
    database: &DatabaseSnapshot,
    blobs: &[BlobSpec],
) -> Result<u64, BackupError> {
    let manifest_json = serde_json::to_vec(manifest)?.len() as f64;
    let database_json = serde_json::to_vec(database)?.len() as f64;

    let fixed = (CHUNK_HEADER_LEN + TAG_LEN) as f64;
    let mut estimate = HEADER_LEN as f64;
    estimate += fixed + 0.3 * manifest_json;
    estimate += fixed + 0.3 * database_json;

    for blob in blobs {
        let parts = part_count(blob.size);
        let header = crate::blob::header::BlobHeader {
            path: blob.path.clone(),
            mime_type: blob.mime_type.clone(),
            size: blob.size,
            part_index: (parts > 1).then_some(0),
            total_parts: (parts > 1).then(|| parts as u32),
        };
        let header_json = serde_json::to_vec(&header)?.len() as u64;
        estimate += (parts * (CHUNK_HEADER_LEN as u64 + header_json)) as f64;
        estimate += blob.size as f64 + TAG_LEN as f64;
    }

    Ok(estimate.ceil() as u64)
}
