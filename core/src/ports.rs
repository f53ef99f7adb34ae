//! Ports the core consumes; the engines behind them live elsewhere.
//!
//! Design notes:
//! - The database is visible only as a single-session query/execute surface;
//!   transactions are driven by the restore adapter with plain
//!   `BEGIN`/`COMMIT`/`ROLLBACK` statements through the same method.
//! - Blob storage is a path-keyed byte store; content addressing, sharding,
//!   and encryption-at-rest are the store's business, not ours.
//! - Implementations report failures as `anyhow::Error`; the adapters fold
//!   them into `BackupError::Io`.

use crate::snapshot::types::{Record, Value};

/// Result of one SQL statement through the database port.
#[derive(Debug, Default)]
pub struct ExecuteResult {
    /// Result rows as ordered column→value records (empty for non-queries).
    pub rows: Vec<Record>,
    /// Rows changed by an INSERT/UPDATE/DELETE, when the engine reports it.
    pub changes: Option<u64>,
    /// Last inserted rowid, when the engine reports it.
    pub last_insert_row_id: Option<i64>,
}

impl ExecuteResult {
    pub fn rows_only(rows: Vec<Record>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

/// Minimal single-session database surface.
pub trait DbPort {
    fn execute(&mut self, sql: &str, params: &[Value]) -> anyhow::Result<ExecuteResult>;
}

/// Path-keyed blob object store.
pub trait BlobPort {
    fn exists(&self, path: &str) -> anyhow::Result<bool>;
    fn retrieve(&self, path: &str) -> anyhow::Result<Vec<u8>>;
    fn store(&mut self, path: &str, bytes: &[u8]) -> anyhow::Result<()>;
}
