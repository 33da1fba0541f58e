//! Tutor chat transcript.

use crate::generation::{ChatRole, ChatTurn, Citation, ContentGenerator, GenerationError};
use futures::StreamExt;
use serde::Serialize;
use uuid::Uuid;

/// Appended in place of a reply when the stream fails.
pub const CHAT_APOLOGY: &str = "I'm sorry, I encountered an error. Please try asking again.";

fn greeting(topic: &str) -> String {
    format!(
        "Hi! I'm your AI Medical Tutor. I can help answer questions about **{topic}**. \
         I can also search the web for the latest clinical guidelines if needed."
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    pub is_error: bool,
}

impl ChatMessage {
    fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            citations: Vec::new(),
            is_error: false,
        }
    }

    /// Merge citations, keeping the first one seen for each URI.
    fn add_citations(&mut self, citations: Vec<Citation>) {
        for citation in citations {
            if !self.citations.iter().any(|c| c.uri == citation.uri) {
                self.citations.push(citation);
            }
        }
    }
}

/// Conversation with the tutor about the current topic.
#[derive(Debug, Default)]
pub struct TutorChat {
    topic: Option<String>,
    messages: Vec<ChatMessage>,
}

impl TutorChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Start over with a greeting when the topic changes.
    pub fn ensure_topic(&mut self, topic: &str) {
        if self.topic.as_deref() != Some(topic) {
            self.topic = Some(topic.to_string());
            self.messages = vec![ChatMessage::new(ChatRole::Model, greeting(topic))];
        }
    }

    fn history(&self) -> Vec<ChatTurn> {
        // the greeting is local only
        self.messages
            .iter()
            .skip(1)
            .filter(|m| !m.is_error)
            .map(|m| ChatTurn {
                role: m.role,
                text: m.text.clone(),
            })
            .collect()
    }

    /// Send a message and stream the reply into the transcript.
    ///
    /// Returns the messages appended after the user's. A failure keeps any
    /// partial reply and adds an apology instead of returning an error.
    pub async fn send(
        &mut self,
        generator: &dyn ContentGenerator,
        topic: &str,
        text: &str,
    ) -> Vec<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        self.ensure_topic(topic);

        let history = self.history();
        self.messages.push(ChatMessage::new(ChatRole::User, text));
        let first_new = self.messages.len();

        if let Err(e) = self.stream_reply(generator, topic, &history, text).await {
            tracing::warn!(error = %e, "tutor reply failed");
            self.messages.push(ChatMessage {
                is_error: true,
                ..ChatMessage::new(ChatRole::Model, CHAT_APOLOGY)
            });
        }

        self.messages[first_new..].to_vec()
    }

    async fn stream_reply(
        &mut self,
        generator: &dyn ContentGenerator,
        topic: &str,
        history: &[ChatTurn],
        text: &str,
    ) -> Result<(), GenerationError> {
        let mut stream = generator.stream_chat_reply(topic, history, text).await?;
        self.messages
            .push(ChatMessage::new(ChatRole::Model, String::new()));
        let reply_index = self.messages.len() - 1;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let reply = &mut self.messages[reply_index];
            reply.text.push_str(&chunk.text);
            reply.add_citations(chunk.citations);
        }
        Ok(())
    }
}
