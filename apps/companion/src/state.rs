//! Application state.

use crate::chat::TutorChat;
use crate::controller::{FlowOptions, StudyFlowController};
use crate::generation::ContentGenerator;
use std::sync::Arc;
use study_core::StatsStore;
use tokio::sync::Mutex as AsyncMutex;

/// Global application state.
pub struct AppState {
    pub controller: StudyFlowController,
    pub chat: AsyncMutex<TutorChat>,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        store: Box<dyn StatsStore>,
        options: FlowOptions,
    ) -> Self {
        Self {
            controller: StudyFlowController::new(generator, store, options),
            chat: AsyncMutex::new(TutorChat::new()),
        }
    }
}
