//! Error types for study-core.

use crate::matching::TileId;
use thiserror::Error;

/// A user command the engines refused to apply.
///
/// Rejected commands leave the engine untouched. Callers usually log these
/// and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown tile {0}")]
    UnknownTile(TileId),

    #[error("tile {0} is already matched")]
    TileMatched(TileId),

    #[error("question {index} out of range ({len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("option {option} out of range for question {index}")]
    OptionOutOfRange { index: usize, option: usize },

    #[error("question {0} is already graded")]
    AlreadyGraded(usize),

    #[error("no option selected for question {0}")]
    NoOptionSelected(usize),

    #[error("question {0} has not been graded")]
    NotGraded(usize),
}

/// Errors raised by a stats store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read stats: {0}")]
    Read(String),

    #[error("failed to write stats: {0}")]
    Write(String),
}

/// Errors raised by the gamification ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("mood score must be between 1 and 5, got {0}")]
    InvalidMood(u8),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
