//! Topic selection and navigation commands.

use crate::controller::FlowSnapshot;
use crate::state::AppState;
use study_core::StudyGuide;

use super::CommandError;

/// Starter topics offered on the home view.
pub const SUGGESTED_TOPICS: [&str; 4] = [
    "Thoracic Surface Anatomy",
    "Coronary Circulation",
    "Cranial Nerves",
    "Brachial Plexus",
];

pub fn suggested_topics() -> Vec<String> {
    SUGGESTED_TOPICS.iter().map(|t| t.to_string()).collect()
}

/// Generate and open a study guide.
pub async fn select_topic(topic: String, state: &AppState) -> Result<FlowSnapshot, CommandError> {
    state.controller.select_topic(&topic).await?;
    Ok(state.controller.snapshot())
}

pub async fn go_home(state: &AppState) -> Result<FlowSnapshot, CommandError> {
    state.controller.go_home();
    Ok(state.controller.snapshot())
}

pub async fn current_guide(state: &AppState) -> Result<Option<StudyGuide>, CommandError> {
    Ok(state.controller.guide())
}
