//! Commands exposed to the front end.
//!
//! Each command takes the shared [`AppState`](crate::state::AppState) and
//! returns a serializable result or a [`CommandError`].

pub mod chat;
pub mod matching;
pub mod media;
pub mod quiz;
pub mod stats;
pub mod study;

use crate::error::FlowError;
use serde::Serialize;

pub use chat::{chat_transcript, send_chat_message};
pub use matching::{reset_matching, select_tile, start_matching};
pub use media::{read_aloud, section_diagram, toggle_diagram};
pub use quiz::{
    check_answer, close_quiz, finish_quiz, jump_to_question, next_question, previous_question,
    quiz_snapshot, select_option, skip_question, start_quiz,
};
pub use stats::{get_stats, record_mood};
pub use study::{current_guide, go_home, select_topic, suggested_topics};

/// Error returned to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
    pub message: String,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<FlowError> for CommandError {
    fn from(e: FlowError) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

/// Treat rejected selections as no-ops, answering with the current view.
pub(crate) fn ignore_rejected<T>(
    result: Result<T, FlowError>,
    current: impl FnOnce() -> Result<T, FlowError>,
) -> Result<T, CommandError> {
    match result {
        Err(FlowError::Selection(e)) => {
            tracing::debug!(error = %e, "ignored invalid selection");
            Ok(current()?)
        }
        other => Ok(other?),
    }
}
