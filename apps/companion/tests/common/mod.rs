//! Common test utilities for integration tests.
//!
//! - [`FakeGenerator`]: a scripted [`ContentGenerator`] whose responses can be
//!   failed or held back until a test releases them
//! - helpers to build a controller or app state on top of it

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream;
use medrecap_companion::controller::{FlowOptions, StudyFlowController};
use medrecap_companion::events::FlowEvent;
use medrecap_companion::generation::{
    ChatChunk, ChatStream, ChatTurn, ContentGenerator, GenerationError,
};
use medrecap_companion::state::AppState;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use study_core::{Difficulty, MemoryStatsStore, QuizSession, StatsStore, StudyGuide, UserStats};
use tokio::sync::{broadcast, Notify};

/// Mismatch revert delay used by tests.
pub const TEST_REVERT_DELAY: Duration = Duration::from_millis(20);

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

pub fn yesterday() -> NaiveDate {
    today().pred_opt().unwrap()
}

/// A chunk of a scripted chat reply, or a stream failure.
pub type ScriptedChunk = Result<ChatChunk, ()>;

#[derive(Default)]
pub struct FakeGenerator {
    failing_topics: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    quiz: Mutex<Option<QuizSession>>,
    diagram: Mutex<Option<Vec<u8>>>,
    diagram_gate: Mutex<Option<Arc<Notify>>>,
    speech: Mutex<Option<Vec<u8>>>,
    chat_reply: Mutex<Vec<ScriptedChunk>>,
    chat_histories: Mutex<Vec<Vec<ChatTurn>>>,
    guide_calls: AtomicUsize,
    quiz_calls: AtomicUsize,
    diagram_calls: AtomicUsize,
}

impl FakeGenerator {
    /// Guides for any topic, a five-question quiz, a small image and audio clip.
    pub fn new() -> Self {
        let fake = Self::default();
        fake.set_quiz(Some(fixtures::quiz(5)));
        fake.set_diagram(Some(vec![0x89, 0x50, 0x4e, 0x47]));
        *fake.speech.lock().unwrap() = Some(vec![0; 4_800]);
        fake
    }

    pub fn fail_topic(&self, topic: &str) {
        self.failing_topics.lock().unwrap().insert(topic.to_string());
    }

    /// Hold the guide for `topic` until the returned handle is notified.
    pub fn gate_topic(&self, topic: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(topic.to_string(), gate.clone());
        gate
    }

    /// `None` makes quiz generation fail.
    pub fn set_quiz(&self, quiz: Option<QuizSession>) {
        *self.quiz.lock().unwrap() = quiz;
    }

    /// `None` makes diagram generation fail.
    pub fn set_diagram(&self, image: Option<Vec<u8>>) {
        *self.diagram.lock().unwrap() = image;
    }

    pub fn gate_diagrams(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.diagram_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn set_chat_reply(&self, chunks: Vec<ScriptedChunk>) {
        *self.chat_reply.lock().unwrap() = chunks;
    }

    pub fn chat_histories(&self) -> Vec<Vec<ChatTurn>> {
        self.chat_histories.lock().unwrap().clone()
    }

    pub fn guide_calls(&self) -> usize {
        self.guide_calls.load(Ordering::SeqCst)
    }

    pub fn quiz_calls(&self) -> usize {
        self.quiz_calls.load(Ordering::SeqCst)
    }

    pub fn diagram_calls(&self) -> usize {
        self.diagram_calls.load(Ordering::SeqCst)
    }
}

fn network_error() -> GenerationError {
    GenerationError::Network("connection reset".to_string())
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate_study_content(&self, topic: &str) -> Result<StudyGuide, GenerationError> {
        self.guide_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(topic).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing_topics.lock().unwrap().contains(topic) {
            return Err(network_error());
        }
        Ok(fixtures::guide(topic))
    }

    async fn generate_quiz_questions(
        &self,
        _topic: &str,
        _difficulty: Difficulty,
    ) -> Result<QuizSession, GenerationError> {
        self.quiz_calls.fetch_add(1, Ordering::SeqCst);
        self.quiz
            .lock()
            .unwrap()
            .clone()
            .ok_or(GenerationError::EmptyResponse)
    }

    async fn generate_diagram_image(
        &self,
        _topic: &str,
        _section_title: &str,
    ) -> Result<Vec<u8>, GenerationError> {
        self.diagram_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.diagram_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.diagram
            .lock()
            .unwrap()
            .clone()
            .ok_or(GenerationError::EmptyResponse)
    }

    async fn generate_speech_audio(&self, _text: &str) -> Result<Vec<u8>, GenerationError> {
        self.speech
            .lock()
            .unwrap()
            .clone()
            .ok_or(GenerationError::EmptyResponse)
    }

    async fn stream_chat_reply(
        &self,
        _topic: &str,
        history: &[ChatTurn],
        _message: &str,
    ) -> Result<ChatStream, GenerationError> {
        self.chat_histories.lock().unwrap().push(history.to_vec());
        let chunks: Vec<Result<ChatChunk, GenerationError>> = self
            .chat_reply
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(|chunk| chunk.map_err(|_| network_error()))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

pub fn options() -> FlowOptions {
    FlowOptions {
        clock: Arc::new(today),
        revert_delay: TEST_REVERT_DELAY,
    }
}

pub fn controller_with(generator: Arc<FakeGenerator>, store: Box<dyn StatsStore>) -> StudyFlowController {
    StudyFlowController::new(generator, store, options())
}

/// Controller over a fresh fake and stats last touched yesterday.
pub fn controller() -> (StudyFlowController, Arc<FakeGenerator>) {
    let generator = Arc::new(FakeGenerator::new());
    let store = Box::new(MemoryStatsStore::with_stats(UserStats::new(yesterday())));
    (controller_with(generator.clone(), store), generator)
}

pub fn app_state() -> (AppState, Arc<FakeGenerator>) {
    let generator = Arc::new(FakeGenerator::new());
    let store = Box::new(MemoryStatsStore::with_stats(UserStats::new(yesterday())));
    (AppState::new(generator.clone(), store, options()), generator)
}

/// Everything received so far, without waiting.
pub fn drain(events: &mut broadcast::Receiver<FlowEvent>) -> Vec<FlowEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

pub fn alerts(events: &[FlowEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            FlowEvent::Alert { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
