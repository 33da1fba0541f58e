//! Content generation service boundary.
//!
//! Everything the app asks of the AI backend goes through [`ContentGenerator`]
//! so the controller can be driven by a scripted generator in tests.

pub mod gemini;
pub mod schema;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use study_core::{Difficulty, QuizSession, StudyGuide};

pub use gemini::{GeminiClient, GeminiConfig};

/// Generation errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Generator error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Generator returned no content")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}

/// A web source backing part of a chat reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

/// One streamed piece of a chat reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatChunk {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Model,
}

/// Earlier turn of the conversation, sent along with a new message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// Lazily produced reply chunks.
pub type ChatStream = BoxStream<'static, Result<ChatChunk, GenerationError>>;

/// The generative backend.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce a structured study guide for a topic.
    async fn generate_study_content(&self, topic: &str) -> Result<StudyGuide, GenerationError>;

    /// Produce a fresh set of quiz questions.
    async fn generate_quiz_questions(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<QuizSession, GenerationError>;

    /// Raster diagram for one section, as raw image bytes.
    async fn generate_diagram_image(
        &self,
        topic: &str,
        section_title: &str,
    ) -> Result<Vec<u8>, GenerationError>;

    /// Spoken text as raw PCM (16-bit signed, mono, 24 kHz).
    async fn generate_speech_audio(&self, text: &str) -> Result<Vec<u8>, GenerationError>;

    /// Stream a tutor reply to `message`, given the conversation so far.
    async fn stream_chat_reply(
        &self,
        topic: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChatStream, GenerationError>;
}
