//! Decoder orchestrator: container bytes in, decoded backup out.
//!
//! Design notes:
//! - The header is validated (magic, version gate) before the key is
//!   derived, so a file from a newer build never costs 600k PBKDF2 rounds.
//! - One pre-scan pass counts chunks for progress totals and catches
//!   truncation before any decryption starts.
//! - An authentication failure on the first chunk is `InvalidPassword`; on
//!   any later chunk the key has already opened something, so the same
//!   failure is `Corrupt`. Decompression failures are always `Corrupt`,
//!   because decryption succeeding means the tag (and thus the key) was
//!   good.
//! - Chunks are accepted in any order after the header; the manifest and
//!   database singletons must each appear exactly once, and the blob part
//!   map must be empty at EOF.

use tracing::debug;

use crate::blob::header::decode_blob_payload;
use crate::blob::reassemble::{DecodedBlob, Reassembler};
use crate::constants::HEADER_LEN;
use crate::container::framing::{read_chunk, scan_chunks, ChunkType};
use crate::container::header::FileHeader;
use crate::crypto::derive_key;
use crate::error::BackupError;
use crate::pipeline::{open_chunk, PipelineError};
use crate::progress::{emit, Phase, ProgressSink};
use crate::snapshot::types::{DatabaseSnapshot, Manifest};

/// Everything decoded from one container. Transient: lives only long enough
/// for the restore that consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBackup {
    pub manifest: Manifest,
    pub database: DatabaseSnapshot,
    pub blobs: Vec<DecodedBlob>,
}

/// Decode and validate a full container.
pub fn decode_backup(
    bytes: &[u8],
    password: &str,
    mut progress: Option<&mut dyn ProgressSink>,
) -> Result<DecodedBackup, BackupError> {
    let header = FileHeader::decode(bytes)?;
    let total_chunks = scan_chunks(bytes, HEADER_LEN)?;
    debug!(chunks = total_chunks, version = header.version, "pre-scan ok");

    let key = derive_key(password, &header.salt);

    let mut manifest: Option<Manifest> = None;
    let mut database: Option<DatabaseSnapshot> = None;
    let mut reassembler = Reassembler::new();
    let mut blobs: Vec<DecodedBlob> = Vec::new();

    let mut offset = HEADER_LEN;
    let mut index = 0usize;
    while offset < bytes.len() {
        let (chunk_header, payload, next) = read_chunk(bytes, offset)?;
        let plaintext = open_chunk(&chunk_header, payload, &key).map_err(|e| match e {
            PipelineError::AuthFailed if index == 0 => BackupError::InvalidPassword,
            PipelineError::AuthFailed => {
                BackupError::Corrupt(format!("chunk {index} failed authentication"))
            }
            PipelineError::BadDeflate(msg) => {
                BackupError::Corrupt(format!("chunk {index} failed decompression: {msg}"))
            }
            PipelineError::Seal(msg) => BackupError::Corrupt(msg),
        })?;

        let mut current_item = None;
        let phase = match chunk_header.chunk_type {
            ChunkType::Manifest => {
                if manifest.is_some() {
                    return Err(BackupError::InvalidContainer("duplicate manifest".into()));
                }
                let parsed: Manifest = serde_json::from_slice(&plaintext)?;
                if parsed.format_version != header.version {
                    return Err(BackupError::DecodeSchema(format!(
                        "manifest formatVersion {} does not match header version {}",
                        parsed.format_version, header.version
                    )));
                }
                manifest = Some(parsed);
                Phase::Preparing
            }
            ChunkType::Database => {
                if database.is_some() {
                    return Err(BackupError::InvalidContainer("duplicate database".into()));
                }
                database = Some(serde_json::from_slice(&plaintext)?);
                Phase::Database
            }
            ChunkType::Blob => {
                let (blob_header, part) = decode_blob_payload(&plaintext)
                    .map_err(|e| BackupError::DecodeSchema(e.to_string()))?;
                let path = blob_header.path.clone();
                if let Some(done) = reassembler.accept(blob_header, part.to_vec())? {
                    debug!(path = %done.path, size = done.size, "blob reassembled");
                    blobs.push(done);
                }
                current_item = Some(path);
                Phase::Blobs
            }
        };

        index += 1;
        if !emit(
            &mut progress,
            phase,
            index,
            total_chunks,
            current_item.as_deref(),
        ) {
            return Err(BackupError::Cancelled);
        }
        offset = next;
    }

    let manifest =
        manifest.ok_or_else(|| BackupError::InvalidContainer("missing manifest chunk".into()))?;
    let database =
        database.ok_or_else(|| BackupError::InvalidContainer("missing database chunk".into()))?;

    if !reassembler.is_empty() {
        return Err(BackupError::IncompleteSplitBlob(
            reassembler.outstanding_paths(),
        ));
    }

    if !emit(
        &mut progress,
        Phase::Finalizing,
        total_chunks,
        total_chunks,
        None,
    ) {
        return Err(BackupError::Cancelled);
    }

    Ok(DecodedBackup {
        manifest,
        database,
        blobs,
    })
}

/// Outcome of [`quick_validate`].
#[derive(Debug)]
pub enum QuickValidation {
    /// First chunk decrypted into a well-formed manifest.
    Valid { manifest: Manifest },
    /// The file is framed correctly but unusable as-is (wrong password,
    /// damaged first chunk, or a first chunk that is not a manifest).
    Invalid { reason: BackupError },
}

impl QuickValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, QuickValidation::Valid { .. })
    }
}

/// Cheap pre-restore probe: decrypt only the first chunk.
///
/// Structural problems with the file itself (bad magic, future version,
/// truncation) are real errors; a wrong password or unusable first chunk is
/// a normal `Invalid` outcome the UI can prompt on.
pub fn quick_validate(bytes: &[u8], password: &str) -> Result<QuickValidation, BackupError> {
    let header = FileHeader::decode(bytes)?;
    let (chunk_header, payload, _) = read_chunk(bytes, HEADER_LEN)?;
    let key = derive_key(password, &header.salt);

    let plaintext = match open_chunk(&chunk_header, payload, &key) {
        Ok(plaintext) => plaintext,
        Err(PipelineError::AuthFailed) => {
            return Ok(QuickValidation::Invalid {
                reason: BackupError::InvalidPassword,
            })
        }
        Err(PipelineError::BadDeflate(msg)) | Err(PipelineError::Seal(msg)) => {
            return Ok(QuickValidation::Invalid {
                reason: BackupError::Corrupt(msg),
            })
        }
    };

    if chunk_header.chunk_type != ChunkType::Manifest {
        return Ok(QuickValidation::Invalid {
            reason: BackupError::InvalidContainer("first chunk is not a manifest".into()),
        });
    }

    match serde_json::from_slice::<Manifest>(&plaintext) {
        Ok(manifest) => Ok(QuickValidation::Valid { manifest }),
        Err(e) => Ok(QuickValidation::Invalid {
            reason: BackupError::DecodeSchema(e.to_string()),
        }),
    }
}
