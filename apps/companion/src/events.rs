//! Notifications pushed to whatever renders the flow.

use serde::Serialize;
use study_core::{QuizOutcome, TileId, UserStats, ViewState};
use tokio::sync::broadcast;

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowEvent {
    ViewChanged { view: ViewState },
    Loading { active: bool },
    QuizLoading { active: bool },
    GuideReady { topic: String },
    QuizReady { questions: usize },
    QuizResults { outcome: QuizOutcome, points_awarded: u64, mastered: bool },
    TileReverted { section: String, tiles: [TileId; 2] },
    StatsUpdated { stats: UserStats },
    Alert { message: String },
}

/// Broadcast channel for [`FlowEvent`]s. Sending never fails.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FlowEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: FlowEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
