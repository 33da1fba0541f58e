//! Tutor chat commands.

use crate::chat::ChatMessage;
use crate::error::FlowError;
use crate::state::AppState;

use super::CommandError;

/// Ask the tutor about the loaded topic. Returns the new model messages.
pub async fn send_chat_message(
    message: String,
    state: &AppState,
) -> Result<Vec<ChatMessage>, CommandError> {
    let topic = state
        .controller
        .guide()
        .map(|g| g.topic)
        .ok_or(FlowError::NoGuide)?;
    let generator = state.controller.generator();

    let mut chat = state.chat.lock().await;
    Ok(chat.send(generator.as_ref(), &topic, &message).await)
}

/// Messages about the loaded topic, starting with the tutor's greeting.
pub async fn chat_transcript(state: &AppState) -> Result<Vec<ChatMessage>, CommandError> {
    let mut chat = state.chat.lock().await;
    if let Some(guide) = state.controller.guide() {
        chat.ensure_topic(&guide.topic);
    }
    Ok(chat.messages().to_vec())
}
