//! Top-level orchestration: snapshot+encode and decode+restore, driven
//! through an explicit context instead of ambient singletons.

use chrono::Utc;

use crate::constants::FORMAT_VERSION;
use crate::decode::decode_backup;
use crate::encode::encode_backup;
use crate::error::BackupError;
use crate::ports::{BlobPort, DbPort};
use crate::progress::ProgressSink;
use crate::snapshot::dump::{enumerate_blobs, snapshot_database};
use crate::snapshot::restore::{restore_into, RestoreReport};
use crate::snapshot::types::{Manifest, Platform};

/// Caller-supplied facts about the producing app, stamped into the manifest.
#[derive(Debug, Clone)]
pub struct BackupMeta {
    pub platform: Platform,
    pub app_version: String,
    pub instance_name: Option<String>,
}

/// The two ports plus an optional progress sink, threaded through one
/// backup or restore operation.
pub struct Context<'a> {
    pub db: &'a mut dyn DbPort,
    pub blobs: &'a mut dyn BlobPort,
    pub progress: Option<&'a mut dyn ProgressSink>,
}

/// Snapshot the instance behind `ctx.db`/`ctx.blobs` and encode it into a
/// container buffer.
pub fn create_backup<'a>(
    ctx: &'a mut Context<'a>,
    password: &str,
    meta: &BackupMeta,
) -> Result<Vec<u8>, BackupError> {
    let database = snapshot_database(ctx.db)?;
    let blob_specs = enumerate_blobs(ctx.db, ctx.blobs)?;

    let manifest = Manifest {
        created_at: Utc::now(),
        platform: meta.platform.clone(),
        app_version: meta.app_version.clone(),
        format_version: FORMAT_VERSION,
        blob_count: blob_specs.len() as u64,
        blob_total_size: blob_specs.iter().map(|b| b.size).sum(),
        instance_name: meta.instance_name.clone(),
    };

    let Context { blobs, progress, .. } = ctx;
    encode_backup(
        password,
        &manifest,
        &database,
        &blob_specs,
        |path| blobs.retrieve(path),
        progress.as_deref_mut(),
    )
}

/// Decode a container and restore it into the fresh instance behind the
/// context's ports.
pub fn restore_backup<'a>(
    ctx: &'a mut Context<'a>,
    bytes: &[u8],
    password: &str,
) -> Result<RestoreReport, BackupError> {
    let decoded = decode_backup(bytes, password, ctx.progress.as_deref_mut())?;
    restore_into(ctx.db, ctx.blobs, &decoded)
}
