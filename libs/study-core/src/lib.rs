//! Core study library used by the companion app.
//!
//! Provides:
//! - Shared types (StudyGuide, QuizQuestion, UserStats, etc.)
//! - Matching game engine for term/definition recall
//! - Quiz session state machine
//! - Gamification ledger (points, streaks, mastery) over a pluggable store

pub mod error;
pub mod gamification;
pub mod matching;
pub mod quiz;
pub mod types;

pub use error::{LedgerError, PersistenceError, SelectionError};
pub use gamification::{GamificationLedger, MemoryStatsStore, QuizReward, StatsStore};
pub use matching::{
    MatchingEngine, PendingRevert, SelectOutcome, Tile, TileId, TileKind, TileStatus,
    MISMATCH_REVERT_DELAY,
};
pub use quiz::{
    NextStep, QuestionState, QuestionStatus, QuizOutcome, QuizProgress, QuizSessionEngine,
};
pub use types::{
    Difficulty, MatchingPair, QuizQuestion, QuizSession, Section, StudyGuide, UserStats,
    ViewState,
};
