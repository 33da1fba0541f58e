//! Points, streaks and mastery derived from study activity.

use crate::error::{LedgerError, PersistenceError};
use crate::types::UserStats;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Points awarded per correct quiz answer.
pub const POINTS_PER_CORRECT: u64 = 10;

/// Minimum score (percent) for a quiz to count a topic as mastered.
pub const MASTERY_THRESHOLD_PERCENT: usize = 80;

/// Durable storage for the single stats record.
pub trait StatsStore: Send + Sync {
    /// Read the stored record, `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<UserStats>, PersistenceError>;

    /// Replace the stored record.
    fn save(&self, stats: &UserStats) -> Result<(), PersistenceError>;
}

impl<T: StatsStore + ?Sized> StatsStore for Box<T> {
    fn load(&self) -> Result<Option<UserStats>, PersistenceError> {
        (**self).load()
    }

    fn save(&self, stats: &UserStats) -> Result<(), PersistenceError> {
        (**self).save(stats)
    }
}

impl<T: StatsStore + ?Sized> StatsStore for Arc<T> {
    fn load(&self) -> Result<Option<UserStats>, PersistenceError> {
        (**self).load()
    }

    fn save(&self, stats: &UserStats) -> Result<(), PersistenceError> {
        (**self).save(stats)
    }
}

/// In-process store, for tests and for running without a data directory.
#[derive(Debug, Default)]
pub struct MemoryStatsStore {
    stats: Mutex<Option<UserStats>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: UserStats) -> Self {
        Self {
            stats: Mutex::new(Some(stats)),
        }
    }
}

impl StatsStore for MemoryStatsStore {
    fn load(&self) -> Result<Option<UserStats>, PersistenceError> {
        self.stats
            .lock()
            .map(|s| s.clone())
            .map_err(|e| PersistenceError::Read(e.to_string()))
    }

    fn save(&self, stats: &UserStats) -> Result<(), PersistenceError> {
        let mut slot = self
            .stats
            .lock()
            .map_err(|e| PersistenceError::Write(e.to_string()))?;
        *slot = Some(stats.clone());
        Ok(())
    }
}

/// What a finished quiz earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizReward {
    pub points_awarded: u64,
    pub mastered: bool,
}

/// Whether `correct` out of `total` reaches the mastery threshold.
pub fn is_mastery(correct: usize, total: usize) -> bool {
    total > 0 && correct as u128 * 100 >= total as u128 * MASTERY_THRESHOLD_PERCENT as u128
}

/// Keeps the user's stats and writes every change through to the store.
#[derive(Debug)]
pub struct GamificationLedger<S> {
    store: S,
    stats: UserStats,
}

impl<S: StatsStore> GamificationLedger<S> {
    /// Load persisted stats, falling back to defaults dated `today`.
    pub fn load(store: S, today: NaiveDate) -> Self {
        let stats = match store.load() {
            Ok(Some(stats)) => stats,
            Ok(None) => UserStats::new(today),
            Err(e) => {
                tracing::warn!(error = %e, "stats unreadable, starting from defaults");
                UserStats::new(today)
            }
        };
        Self { store, stats }
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Count a study day. Returns whether the streak moved.
    ///
    /// Same-day calls are no-ops. Missed days do not reset the streak.
    pub fn record_study_session(&mut self, date: NaiveDate) -> Result<bool, LedgerError> {
        if date == self.stats.last_study_date {
            return Ok(false);
        }

        self.stats.streak_days = self.stats.streak_days.saturating_add(1);
        self.stats.last_study_date = date;
        self.persist()?;
        Ok(true)
    }

    /// Award points and, at 80% or better, a mastered topic.
    pub fn record_quiz_completion(
        &mut self,
        correct: usize,
        total: usize,
    ) -> Result<QuizReward, LedgerError> {
        let reward = QuizReward {
            points_awarded: (correct as u64).saturating_mul(POINTS_PER_CORRECT),
            mastered: is_mastery(correct, total),
        };

        self.stats.points = self.stats.points.saturating_add(reward.points_awarded);
        if reward.mastered {
            self.stats.topics_mastered = self.stats.topics_mastered.saturating_add(1);
        }
        self.persist()?;
        Ok(reward)
    }

    /// Store the latest mood check-in (1-5).
    pub fn record_mood(&mut self, score: u8) -> Result<(), LedgerError> {
        if !(1..=5).contains(&score) {
            return Err(LedgerError::InvalidMood(score));
        }
        self.stats.mood_score = Some(score);
        self.persist()
    }

    fn persist(&self) -> Result<(), LedgerError> {
        self.store.save(&self.stats)?;
        Ok(())
    }
}
