//! Repository pattern for database access.

use crate::db::error::DbError;
use crate::db::schema::{SCHEMA, SCHEMA_VERSION, USER_STATS_KEY};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use study_core::{PersistenceError, StatsStore, UserStats};

type Result<T> = std::result::Result<T, DbError>;

/// Repository for whole-document JSON records.
pub trait KeyValueRepository {
    fn get_raw(&self, key: &str) -> Result<Option<String>>;
    fn put_raw(&self, key: &str, value: &str) -> Result<()>;

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        self.get_raw(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| DbError::InvalidData {
                    key: key.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value).map_err(|e| DbError::InvalidData {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.put_raw(key, &raw)
    }
}

/// SQLite implementation of repositories.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }
}

impl KeyValueRepository for SqliteRepository {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.conn()?
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }
}

impl StatsStore for SqliteRepository {
    fn load(&self) -> std::result::Result<Option<UserStats>, PersistenceError> {
        self.get_json(USER_STATS_KEY)
            .map_err(|e| PersistenceError::Read(e.to_string()))
    }

    fn save(&self, stats: &UserStats) -> std::result::Result<(), PersistenceError> {
        self.put_json(USER_STATS_KEY, stats)
            .map_err(|e| PersistenceError::Write(e.to_string()))
    }
}
