//! Diagram and speech commands.

use crate::media::{DiagramView, SpeechClip};
use crate::state::AppState;

use super::CommandError;

pub async fn section_diagram(section: String, state: &AppState) -> Result<DiagramView, CommandError> {
    state
        .controller
        .section_diagram(&section)
        .await
        .map_err(Into::into)
}

/// Hide or show a section's diagram.
pub async fn toggle_diagram(section: String, state: &AppState) -> Result<DiagramView, CommandError> {
    Ok(state.controller.toggle_diagram(&section))
}

pub async fn read_aloud(section: String, state: &AppState) -> Result<SpeechClip, CommandError> {
    state
        .controller
        .read_aloud(&section)
        .await
        .map_err(Into::into)
}
