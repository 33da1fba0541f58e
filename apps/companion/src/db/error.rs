//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid data for {key}: {message}")]
    InvalidData { key: String, message: String },

    #[error("database lock poisoned")]
    LockPoisoned,
}
