//! Decode-side restore adapter: push a decoded backup into a fresh
//! instance through the database and blob-store ports.
//!
//! Design notes:
//! - Foreign-key enforcement is off for the duration; snapshot row order
//!   does not respect referential dependencies.
//! - Inserts are batched with `columns * rows_per_batch <= 999` (the
//!   historical SQLite bound-parameter limit). A failed batch falls back to
//!   per-row inserts; per-row failures are logged and skipped, never fatal.
//!   Historical snapshots can contain rows that conflict with newer
//!   invariants, and losing one row beats losing the restore.
//! - `schema_migrations` is never restored; the migration runner owns it.
//! - A failed restore leaves the partially populated instance in place; the
//!   caller decides whether to delete it from the registry.

use std::fmt;

use tracing::{debug, info, warn};

use crate::constants::SQLITE_MAX_BOUND_PARAMS;
use crate::decode::DecodedBackup;
use crate::error::BackupError;
use crate::ports::{BlobPort, DbPort};
use crate::snapshot::dump::quote_ident;
use crate::snapshot::types::{Record, Value};

/// Progress of one restore, in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RestoreStage {
    Start,
    Decoded,
    InstanceCreated,
    SchemaReady,
    DataRestored,
    BlobsRestored,
    Done,
}

impl fmt::Display for RestoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestoreStage::Start => "start",
            RestoreStage::Decoded => "decoded",
            RestoreStage::InstanceCreated => "instance-created",
            RestoreStage::SchemaReady => "schema-ready",
            RestoreStage::DataRestored => "data-restored",
            RestoreStage::BlobsRestored => "blobs-restored",
            RestoreStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a restore actually did, including best-effort skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub stage: RestoreStage,
    pub tables_restored: usize,
    pub rows_inserted: u64,
    pub rows_skipped: u64,
    pub blobs_written: usize,
}

/// Tables whose contents the migration runner re-populates on its own.
const SKIP_ON_RESTORE: &[&str] = &["schema_migrations"];

/// Coerce a decoded scalar into its SQLite binding form.
///
/// Booleans become 0/1 here and only here; the snapshot keeps them as JSON
/// booleans. Dates were already epoch-millisecond integers when dumped.
fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Bool(true) => Value::Int(1),
        Value::Bool(false) => Value::Int(0),
        other => other.clone(),
    }
}

/// Restore schema, data, and blobs into a freshly created instance.
///
/// The instance itself (and its baseline migrations) is the caller's
/// responsibility; this drives the `InstanceCreated → Done` stages.
pub fn restore_into(
    db: &mut dyn DbPort,
    store: &mut dyn BlobPort,
    decoded: &DecodedBackup,
) -> Result<RestoreReport, BackupError> {
    let mut report = RestoreReport {
        stage: RestoreStage::InstanceCreated,
        tables_restored: 0,
        rows_inserted: 0,
        rows_skipped: 0,
        blobs_written: 0,
    };

    db.execute("PRAGMA foreign_keys = OFF", &[])
        .map_err(BackupError::from_port)?;

    ensure_schema(db, decoded)?;
    report.stage = RestoreStage::SchemaReady;
    info!(stage = %report.stage, "schema applied");

    for (table, rows) in decoded.database.data.iter() {
        if SKIP_ON_RESTORE.contains(&table) {
            debug!(table, "skipped (migration runner owns it)");
            continue;
        }
        let (inserted, skipped) = restore_table(db, table, rows)?;
        report.rows_inserted += inserted;
        report.rows_skipped += skipped;
        report.tables_restored += 1;
    }
    report.stage = RestoreStage::DataRestored;
    info!(
        stage = %report.stage,
        tables = report.tables_restored,
        rows = report.rows_inserted,
        skipped = report.rows_skipped,
        "data restored"
    );

    db.execute("PRAGMA foreign_keys = ON", &[])
        .map_err(BackupError::from_port)?;

    for blob in &decoded.blobs {
        // Historical exports stored objects under an `.enc` suffix; the
        // restored object goes back under the plain name.
        let path = blob.path.strip_suffix(".enc").unwrap_or(&blob.path);
        store
            .store(path, &blob.bytes)
            .map_err(BackupError::from_port)?;
        report.blobs_written += 1;
    }
    report.stage = RestoreStage::BlobsRestored;
    info!(stage = %report.stage, blobs = report.blobs_written, "blobs restored");

    report.stage = RestoreStage::Done;
    Ok(report)
}

/// Create tables and indexes present in the snapshot but missing from the
/// instance. Existing objects are left untouched; the migration runner owns
/// the baseline schema.
fn ensure_schema(db: &mut dyn DbPort, decoded: &DecodedBackup) -> Result<(), BackupError> {
    let existing = db
        .execute("SELECT name FROM sqlite_master WHERE type IN ('table', 'index')", &[])
        .map_err(BackupError::from_port)?;
    let existing: Vec<String> = existing
        .rows
        .iter()
        .filter_map(|row| match row.get("name") {
            Some(Value::Text(s)) => Some(s.clone()),
            _ => None,
        })
        .collect();

    for table in &decoded.database.tables {
        if existing.iter().any(|n| n == &table.name) {
            continue;
        }
        debug!(table = %table.name, "creating missing table");
        db.execute(&table.sql, &[]).map_err(BackupError::from_port)?;
    }

    for index in &decoded.database.indexes {
        if existing.iter().any(|n| n == &index.name) {
            continue;
        }
        debug!(index = %index.name, "creating missing index");
        db.execute(&index.sql, &[]).map_err(BackupError::from_port)?;
    }

    Ok(())
}

/// Insert one table's rows inside a transaction. Returns (inserted, skipped).
fn restore_table(
    db: &mut dyn DbPort,
    table: &str,
    rows: &[Record],
) -> Result<(u64, u64), BackupError> {
    if rows.is_empty() {
        return Ok((0, 0));
    }

    // Column list comes from the first row; a SELECT * dump gives every row
    // the same shape. Absent columns in a degenerate row bind as NULL.
    let columns: Vec<String> = rows[0].keys().map(str::to_string).collect();
    if columns.is_empty() {
        return Ok((0, 0));
    }
    let rows_per_batch = (SQLITE_MAX_BOUND_PARAMS / columns.len()).max(1);

    db.execute("BEGIN", &[]).map_err(BackupError::from_port)?;

    let mut inserted = 0u64;
    let mut skipped = 0u64;
    for batch in rows.chunks(rows_per_batch) {
        let sql = insert_sql(table, &columns, batch.len());
        let params: Vec<Value> = batch
            .iter()
            .flat_map(|row| bind_row(row, &columns))
            .collect();

        match db.execute(&sql, &params) {
            Ok(_) => inserted += batch.len() as u64,
            Err(batch_err) => {
                debug!(table, error = %batch_err, "batch insert failed, retrying per row");
                let single_sql = insert_sql(table, &columns, 1);
                for row in batch {
                    match db.execute(&single_sql, &bind_row(row, &columns)) {
                        Ok(_) => inserted += 1,
                        Err(row_err) => {
                            warn!(table, error = %row_err, "row skipped during restore");
                            skipped += 1;
                        }
                    }
                }
            }
        }
    }

    if let Err(e) = db.execute("COMMIT", &[]) {
        let _ = db.execute("ROLLBACK", &[]);
        return Err(BackupError::from_port(e));
    }

    debug!(table, inserted, skipped, "table restored");
    Ok((inserted, skipped))
}

fn insert_sql(table: &str, columns: &[String], row_count: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let row_placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![row_placeholders; row_count].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list,
        values
    )
}

fn bind_row(row: &Record, columns: &[String]) -> Vec<Value> {
    columns
        .iter()
        .map(|column| row.get(column).map(normalize_value).unwrap_or(Value::Null))
        .collect()
}
