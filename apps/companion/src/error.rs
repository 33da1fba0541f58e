//! Errors raised by the study flow.

use crate::generation::GenerationError;
use study_core::{LedgerError, SelectionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("no study guide loaded")]
    NoGuide,

    #[error("no quiz in progress")]
    NoQuiz,

    #[error("quiz still has skipped questions")]
    QuizUnfinished,

    #[error("unknown section: {0}")]
    UnknownSection(String),

    #[error("a diagram is already being generated")]
    DiagramBusy,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
