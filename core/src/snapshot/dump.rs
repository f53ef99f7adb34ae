//! Encode-side snapshot adapter: pull schemas, indexes, and rows out of the
//! database port, and enumerate blobs from the files table.

use tracing::{debug, warn};

use crate::encode::BlobSpec;
use crate::error::BackupError;
use crate::ports::{BlobPort, DbPort};
use crate::snapshot::types::{
    DatabaseSnapshot, IndexSchema, OrderedMap, Record, TableSchema, Value,
};

/// Catalog tables never included in a snapshot. The prefix rules below also
/// cover `sqlite_*` internals and anything underscore-private.
const EXCLUDED_TABLES: &[&str] = &[
    "sqlite_sequence",
    "sqlite_stat1",
    "sqlite_stat4",
    "__drizzle_migrations",
];

fn is_excluded_table(name: &str) -> bool {
    EXCLUDED_TABLES.contains(&name) || name.starts_with("sqlite_") || name.starts_with('_')
}

fn text_column(record: &Record, column: &str) -> Result<String, BackupError> {
    match record.get(column) {
        Some(Value::Text(s)) => Ok(s.clone()),
        other => Err(BackupError::Io(format!(
            "catalog query returned {other:?} for column {column:?}"
        ))),
    }
}

fn int_column(record: &Record, column: &str) -> Result<i64, BackupError> {
    match record.get(column) {
        Some(Value::Int(v)) => Ok(*v),
        other => Err(BackupError::Io(format!(
            "catalog query returned {other:?} for column {column:?}"
        ))),
    }
}

/// Quote an identifier for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Dump every user table into a [`DatabaseSnapshot`].
pub fn snapshot_database(db: &mut dyn DbPort) -> Result<DatabaseSnapshot, BackupError> {
    let result = db
        .execute(
            "SELECT name, sql FROM sqlite_master \
             WHERE type = 'table' AND sql IS NOT NULL ORDER BY name",
            &[],
        )
        .map_err(BackupError::from_port)?;

    let mut tables = Vec::new();
    for row in &result.rows {
        let name = text_column(row, "name")?;
        if is_excluded_table(&name) {
            continue;
        }
        tables.push(TableSchema {
            sql: text_column(row, "sql")?,
            name,
        });
    }

    let result = db
        .execute(
            "SELECT name, tbl_name, sql FROM sqlite_master \
             WHERE type = 'index' AND sql IS NOT NULL ORDER BY name",
            &[],
        )
        .map_err(BackupError::from_port)?;

    let mut indexes = Vec::new();
    for row in &result.rows {
        let name = text_column(row, "name")?;
        // Auto-generated UNIQUE/PK indexes are re-created by the schema DDL.
        if name.starts_with("sqlite_") {
            continue;
        }
        indexes.push(IndexSchema {
            table_name: text_column(row, "tbl_name")?,
            sql: text_column(row, "sql")?,
            name,
        });
    }

    let mut data = OrderedMap::new();
    for table in &tables {
        let result = db
            .execute(&format!("SELECT * FROM {}", quote_ident(&table.name)), &[])
            .map_err(BackupError::from_port)?;
        debug!(table = %table.name, rows = result.rows.len(), "dumped table");
        data.insert(table.name.clone(), result.rows);
    }

    Ok(DatabaseSnapshot {
        tables,
        indexes,
        data,
    })
}

/// Enumerate blobs scheduled for backup: undeleted `files` rows whose
/// object actually exists in the store. Rows pointing at missing objects
/// are skipped with a warning rather than failing the whole backup.
pub fn enumerate_blobs(
    db: &mut dyn DbPort,
    store: &dyn BlobPort,
) -> Result<Vec<BlobSpec>, BackupError> {
    let result = db
        .execute(
            "SELECT storage_path, mime_type, size FROM files \
             WHERE deleted_at IS NULL ORDER BY storage_path",
            &[],
        )
        .map_err(BackupError::from_port)?;

    let mut specs = Vec::new();
    for row in &result.rows {
        let path = text_column(row, "storage_path")?;
        if !store.exists(&path).map_err(BackupError::from_port)? {
            warn!(path = %path, "blob missing from store, skipping");
            continue;
        }
        specs.push(BlobSpec {
            mime_type: text_column(row, "mime_type")?,
            size: int_column(row, "size")?.max(0) as u64,
            path,
        });
    }

    Ok(specs)
}
