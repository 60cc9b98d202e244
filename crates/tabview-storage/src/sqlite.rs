//! Preference storage using SQLite

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::PreferenceStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Durable preference store backed by a SQLite file.
///
/// One connection is held for the life of the store; calls are serialized
/// through it.
pub struct SqlitePreferenceStore {
    db_path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqlitePreferenceStore {
    /// Open or create the database at `path`, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database at {:?}", db_path))?;
        Self::with_connection(db_path, conn)
    }

    /// A private database that disappears with the store
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        Self::with_connection(PathBuf::from(":memory:"), conn)
    }

    fn with_connection(db_path: PathBuf, conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA, [])
            .with_context(|| format!("Failed to create preferences table in {:?}", db_path))?;
        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl std::fmt::Debug for SqlitePreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePreferenceStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("Failed to read preference '{}'", key))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .lock()
            .execute(
                "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("Failed to write preference '{}'", key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .lock()
            .execute("DELETE FROM preferences WHERE key = ?1", params![key])
            .with_context(|| format!("Failed to remove preference '{}'", key))?;
        Ok(rows > 0)
    }
}
