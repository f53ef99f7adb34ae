//! rbu-core
//!
//! Encrypted, compressed, chunked backup container (`.rbu`) and the
//! encode/decode pipeline on top of it: password-derived AES-256-GCM per
//! chunk, gzip before encryption, split/reassembled blobs, and the
//! snapshot/restore adapters that connect the codec to a database port and
//! a blob store.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod error;

// Codec layers
pub mod compression;
pub mod container;
pub mod crypto;
pub mod pipeline;

// Payloads
pub mod blob;
pub mod snapshot;

// Orchestration
pub mod context;
pub mod decode;
pub mod encode;
pub mod ports;
pub mod progress;

pub use blob::{BlobHeader, DecodedBlob};
pub use context::{create_backup, restore_backup, BackupMeta, Context};
pub use decode::{decode_backup, quick_validate, DecodedBackup, QuickValidation};
pub use encode::{encode_backup, estimate_backup_size, BlobSpec};
pub use error::BackupError;
pub use ports::{BlobPort, DbPort, ExecuteResult};
pub use progress::{Phase, ProgressEvent, ProgressSink};
pub use snapshot::restore::{restore_into, RestoreReport, RestoreStage};
pub use snapshot::types::{
    DatabaseSnapshot, IndexSchema, Manifest, OrderedMap, Platform, Record, TableSchema, Value,
};
