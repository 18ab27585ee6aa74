use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};

use crate::learning::LearningPersistence;

pub const LEARNING_KEY: &str = "learning";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS blob (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)";

pub fn open_memory() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    conn.execute(SCHEMA, [])?;
    Ok(conn)
}

pub fn open_file(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute(SCHEMA, [])?;
    Ok(conn)
}

pub fn read_blob(db: &Connection, key: &str) -> Result<Option<String>, StoreError> {
    let value = db
        .query_row(
            "SELECT value FROM blob WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn write_blob(db: &Connection, key: &str, value: &str) -> Result<(), StoreError> {
    db.execute(
        "INSERT INTO blob (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
        params![key, value, now_secs()],
    )?;
    Ok(())
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Keeps the learning table as a single JSON blob row.
pub struct BlobStore {
    db: Connection,
    key: String,
}

impl BlobStore {
    pub fn new(db: Connection) -> Self {
        Self {
            db,
            key: LEARNING_KEY.to_string(),
        }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(open_file(path)?))
    }
}

impl LearningPersistence for BlobStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        read_blob(&self.db, &self.key)
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        write_blob(&self.db, &self.key, blob)
    }
}
