//! Matching game commands.

use crate::controller::BoardView;
use crate::state::AppState;
use study_core::{SelectOutcome, TileId};

use super::{ignore_rejected, CommandError};

#[derive(Debug, serde::Serialize)]
pub struct TileResponse {
    /// `None` when the click was ignored.
    pub outcome: Option<SelectOutcome>,
    pub board: BoardView,
}

pub async fn start_matching(section: String, state: &AppState) -> Result<BoardView, CommandError> {
    state
        .controller
        .matching_board(&section)
        .map_err(Into::into)
}

/// Click a tile by its `term-N` / `def-N` id.
pub async fn select_tile(
    section: String,
    tile_id: String,
    state: &AppState,
) -> Result<TileResponse, CommandError> {
    let tile = TileId::parse(&tile_id).ok_or_else(|| CommandError {
        message: format!("invalid tile id: {}", tile_id),
    })?;

    let result = state
        .controller
        .select_tile(&section, tile)
        .map(|(outcome, board)| TileResponse {
            outcome: Some(outcome),
            board,
        });
    ignore_rejected(result, || {
        state
            .controller
            .matching_board(&section)
            .map(|board| TileResponse {
                outcome: None,
                board,
            })
    })
}

pub async fn reset_matching(section: String, state: &AppState) -> Result<BoardView, CommandError> {
    state
        .controller
        .reset_matching(&section)
        .map_err(Into::into)
}
