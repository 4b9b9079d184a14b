//! Durable key-value storage
//!
//! String keys map to string values. `SqliteKeyValueStore` is the on-disk
//! backend; `MemoryKeyValueStore` keeps everything in a map for tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use super::fs::ensure_dir;
use super::schema::{init_schema, needs_init};

/// Suffix appended to a damaged database file when it is moved aside
pub const CORRUPT_BACKUP_SUFFIX: &str = "corrupt.backup";

/// Process-wide string storage that survives restarts
pub trait KeyValueStore {
    /// Read a value, `None` when the key has never been written
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write several values as one unit; either all land or none do
    fn set_many(&mut self, entries: &[(&str, String)]) -> StorageResult<()>;
}

/// Key-value store backed by a SQLite `prefs` table
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    /// Open or create the database at `path`
    ///
    /// A file SQLite does not recognise as a database is renamed to
    /// `<name>.corrupt.backup` and a fresh database takes its place.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }

        match Self::open_at(path) {
            Err(StorageError::Database(e)) if is_unreadable_database(&e) => {
                let backup_path = corrupt_backup_path(path);
                fs::rename(path, &backup_path)
                    .map_err(|e| StorageError::from_io(e, backup_path.clone()))?;

                let err = StorageError::CorruptDatabase {
                    path: path.to_path_buf(),
                    backup_path,
                    details: e.to_string(),
                };
                warn!("{} {}", err, err.recovery_suggestion().unwrap_or_default());

                Self::open_at(path)
            }
            result => result,
        }
    }

    fn open_at(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        debug!("Opened key-value store at {:?}", path);
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM prefs WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT OR REPLACE INTO prefs (key, value) VALUES (?, ?)")?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn is_unreadable_database(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(failure.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    )
}

/// `catalog.db` -> `catalog.db.corrupt.backup`
fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(CORRUPT_BACKUP_SUFFIX);
    path.with_file_name(name)
}

/// Key-value store held entirely in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}
