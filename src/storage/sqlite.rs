//! SQLite-backed storage.
//!
//! # Invariants
//! - The `resources` table exists before any operation runs; it is created
//!   when missing and never migrated.
//! - Ids come from `AUTOINCREMENT`, so a deleted id is never handed out again.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use rusqlite::{Connection, params};
use tracing::{error, info};

use crate::model::Resource;

use super::{Storage, StorageError, StorageResult};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);";

/// Resource collection stored in one SQLite table.
///
/// The connection sits behind a mutex: rusqlite connections are `Send` but
/// not `Sync`, and SQLite serializes writers per statement anyway.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database file at `path` and ensures the
    /// `resources` table exists.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!(path = %path.display(), "opening database");

        let result = Connection::open(path)
            .map_err(StorageError::from)
            .and_then(Self::bootstrap);

        match &result {
            Ok(_) => info!(
                path = %path.display(),
                duration_ms = started_at.elapsed().as_millis() as u64,
                "database connection successfully initialized"
            ),
            Err(err) => error!(
                path = %path.display(),
                duration_ms = started_at.elapsed().as_millis() as u64,
                "failed to open database: {err}"
            ),
        }
        result
    }

    /// Opens a private in-memory database with the `resources` table.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(CREATE_TABLE_SQL)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Storage for SqliteStorage {
    fn list(&self) -> StorageResult<Vec<Resource>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached("SELECT id, name FROM resources ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Resource { id: row.get(0)?, name: row.get(1)? })
        })?;
        let resources = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(resources)
    }

    fn add(&self, name: &str) -> StorageResult<Resource> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO resources (name) VALUES (?1)", params![name])?;
        Ok(Resource { id: conn.last_insert_rowid(), name: name.to_owned() })
    }

    fn update(&self, id: i64, name: &str) -> StorageResult<()> {
        let changed = self
            .conn()?
            .execute("UPDATE resources SET name = ?1 WHERE id = ?2", params![name, id])?;
        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    fn delete(&self, id: i64) -> StorageResult<()> {
        let changed = self
            .conn()?
            .execute("DELETE FROM resources WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }
}
