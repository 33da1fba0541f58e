//! Statistics commands.

use crate::state::AppState;
use study_core::UserStats;

use super::CommandError;

/// Get the user's points, streak and mastery counts.
pub async fn get_stats(state: &AppState) -> Result<UserStats, CommandError> {
    Ok(state.controller.stats())
}

/// Store a 1-5 mood check-in.
pub async fn record_mood(score: u8, state: &AppState) -> Result<UserStats, CommandError> {
    state.controller.record_mood(score).map_err(Into::into)
}
