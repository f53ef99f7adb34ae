//! Error taxonomy for encode, decode, and restore.
//!
//! Design notes:
//! - One public enum; internal module errors (`CryptoError`, `GzipError`,
//!   `HeaderError`, `FrameError`) convert into it at the orchestrator
//!   boundary.
//! - The `InvalidPassword` / `Corrupt` split is load-bearing: an
//!   authentication failure on the *first* chunk means the key is wrong,
//!   while a failure on a later chunk means the file is damaged, because the
//!   same key already opened an earlier chunk. Only the decoder knows the
//!   chunk position, so the mapping lives there, not in `From` impls.

use thiserror::Error;

use crate::container::framing::FrameError;
use crate::container::header::HeaderError;

/// Everything that can go wrong while producing or consuming a container.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Missing/wrong magic, malformed framing, duplicate manifest, or a
    /// required chunk that never appeared.
    #[error("invalid backup container: {0}")]
    InvalidContainer(String),

    /// Header version is newer than this build supports. Rejected before
    /// any key derivation is attempted.
    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u16),

    /// EOF inside a chunk header or declared payload.
    #[error("truncated backup container")]
    Truncated,

    /// The first chunk failed its GCM tag check; the caller may retry with
    /// a different password.
    #[error("invalid password")]
    InvalidPassword,

    /// A later chunk failed authentication or decompression after the key
    /// had already been demonstrated to work.
    #[error("corrupt backup container: {0}")]
    Corrupt(String),

    /// End of file with blob parts still outstanding.
    #[error("incomplete split blobs: {0:?}")]
    IncompleteSplitBlob(Vec<String>),

    /// Manifest, database, or blob-header JSON failed structural validation.
    #[error("backup payload schema error: {0}")]
    DecodeSchema(String),

    /// The database or blob-storage port failed underneath us.
    #[error("backup I/O failure: {0}")]
    Io(String),

    /// Cooperative cancellation via the progress sink.
    #[error("backup operation cancelled")]
    Cancelled,
}

impl BackupError {
    /// Wrap a port failure, keeping the full error chain in the message.
    pub(crate) fn from_port(err: anyhow::Error) -> Self {
        BackupError::Io(format!("{err:#}"))
    }
}

impl From<HeaderError> for BackupError {
    fn from(e: HeaderError) -> Self {
        match e {
            HeaderError::TooSmall { .. } => BackupError::InvalidContainer("too small".into()),
            HeaderError::WrongMagic { .. } => BackupError::InvalidContainer("wrong magic".into()),
            HeaderError::UnsupportedVersion { have } => BackupError::UnsupportedVersion(have),
        }
    }
}

impl From<FrameError> for BackupError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Truncated { .. } => BackupError::Truncated,
            FrameError::UnknownChunkType { raw } => {
                BackupError::InvalidContainer(format!("unknown chunk type {raw}"))
            }
        }
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(e: serde_json::Error) -> Self {
        BackupError::DecodeSchema(e.to_string())
    }
}
