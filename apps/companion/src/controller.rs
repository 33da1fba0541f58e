//! Top-level study flow: Home, Study and Quiz views and the engines behind them.
//!
//! [`StudyFlowController`] is cheap to clone and shared between the command
//! layer and background tasks. Its state lives behind plain mutexes that are
//! released before every generator call, so a response always lands on
//! whatever state exists when it arrives. Selecting topic A and then topic B
//! leaves A's guide on screen if A's response is the slower one.

use crate::db::date_utils;
use crate::error::FlowError;
use crate::events::{EventBus, FlowEvent};
use crate::generation::ContentGenerator;
use crate::media::{DiagramGallery, DiagramView, SpeechClip};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use study_core::{
    Difficulty, GamificationLedger, MatchingEngine, NextStep, PendingRevert, QuestionState,
    QuizProgress, QuizQuestion, QuizReward, QuizSessionEngine, SelectOutcome, SelectionError,
    StatsStore, StudyGuide, Tile, TileId, UserStats, ViewState,
};
use tokio::runtime::Handle;

pub const STUDY_GUIDE_ALERT: &str =
    "Failed to generate study guide. Please check your API key or try again.";
pub const QUIZ_ALERT: &str = "Could not generate quiz at this time.";

/// Returns the current study day.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Tunables for the controller.
#[derive(Clone)]
pub struct FlowOptions {
    pub clock: Clock,
    /// How long a mismatched pair stays highlighted.
    pub revert_delay: Duration,
}

impl FlowOptions {
    pub fn new(daily_reset_hour: u32) -> Self {
        Self {
            clock: Arc::new(move || date_utils::get_adjusted_today(daily_reset_hour)),
            revert_delay: study_core::MISMATCH_REVERT_DELAY,
        }
    }
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Summary of the flow for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub view: ViewState,
    pub loading: bool,
    pub quiz_loading: bool,
    pub topic: Option<String>,
}

/// The question on screen plus the navigator state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub progress: QuizProgress,
    pub question: Option<QuizQuestion>,
    pub states: Vec<QuestionState>,
}

impl QuizView {
    fn of(quiz: &QuizSessionEngine) -> Self {
        Self {
            progress: quiz.progress(),
            question: quiz.current_question().cloned(),
            states: quiz.states().to_vec(),
        }
    }

    pub fn current_state(&self) -> Option<&QuestionState> {
        self.states.get(self.progress.current_index)
    }
}

/// A section's matching board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub section: String,
    pub tiles: Vec<Tile>,
    pub selected: Option<TileId>,
    pub matched_pairs: usize,
    pub total_pairs: usize,
    pub complete: bool,
}

impl BoardView {
    fn of(section: &str, board: &MatchingEngine) -> Self {
        Self {
            section: section.to_string(),
            tiles: board.tiles().to_vec(),
            selected: board.selected(),
            matched_pairs: board.matched_pairs(),
            total_pairs: board.pairs().len(),
            complete: board.is_complete(),
        }
    }
}

#[derive(Default)]
struct FlowState {
    view: ViewState,
    loading: bool,
    quiz_loading: bool,
    guide: Option<StudyGuide>,
    quiz: Option<QuizSessionEngine>,
    boards: HashMap<String, MatchingEngine>,
    diagrams: DiagramGallery,
}

impl FlowState {
    fn guide(&self) -> Result<&StudyGuide, FlowError> {
        self.guide.as_ref().ok_or(FlowError::NoGuide)
    }

    fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            view: self.view,
            loading: self.loading,
            quiz_loading: self.quiz_loading,
            topic: self.guide.as_ref().map(|g| g.topic.clone()),
        }
    }

    fn board_mut(&mut self, section: &str) -> Result<&mut MatchingEngine, FlowError> {
        if !self.boards.contains_key(section) {
            let pairs = self
                .guide()?
                .section(section)
                .ok_or_else(|| FlowError::UnknownSection(section.to_string()))?
                .matching_pairs
                .clone();
            self.boards
                .insert(section.to_string(), MatchingEngine::new(pairs));
        }
        self.boards
            .get_mut(section)
            .ok_or_else(|| FlowError::UnknownSection(section.to_string()))
    }
}

struct Inner {
    generator: Arc<dyn ContentGenerator>,
    ledger: Mutex<GamificationLedger<Box<dyn StatsStore>>>,
    state: Mutex<FlowState>,
    events: EventBus,
    clock: Clock,
    revert_delay: Duration,
}

/// Drives view transitions, the quiz and matching engines and the ledger.
#[derive(Clone)]
pub struct StudyFlowController {
    inner: Arc<Inner>,
}

impl StudyFlowController {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        store: Box<dyn StatsStore>,
        options: FlowOptions,
    ) -> Self {
        let ledger = GamificationLedger::load(store, (options.clock)());
        Self {
            inner: Arc::new(Inner {
                generator,
                ledger: Mutex::new(ledger),
                state: Mutex::new(FlowState::default()),
                events: EventBus::new(),
                clock: options.clock,
                revert_delay: options.revert_delay,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FlowState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ledger(&self) -> MutexGuard<'_, GamificationLedger<Box<dyn StatsStore>>> {
        self.inner
            .ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: FlowEvent) {
        self.inner.events.emit(event);
    }

    fn set_view(&self, view: ViewState) {
        self.state().view = view;
        tracing::info!(?view, "view changed");
        self.emit(FlowEvent::ViewChanged { view });
    }

    fn alert(&self, message: impl Into<String>) {
        self.emit(FlowEvent::Alert {
            message: message.into(),
        });
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.state().snapshot()
    }

    pub fn view(&self) -> ViewState {
        self.state().view
    }

    pub fn guide(&self) -> Option<StudyGuide> {
        self.state().guide.clone()
    }

    pub fn stats(&self) -> UserStats {
        self.ledger().stats().clone()
    }

    // === Topic & navigation ===

    /// Generate a guide for `topic` and open it.
    ///
    /// On failure the view is left untouched and an alert is raised.
    pub async fn select_topic(&self, topic: &str) -> Result<(), FlowError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(FlowError::EmptyTopic);
        }

        self.state().loading = true;
        self.emit(FlowEvent::Loading { active: true });
        tracing::info!(topic, "generating study guide");

        let result = self.inner.generator.generate_study_content(topic).await;

        let guide = match result {
            Ok(guide) => guide,
            Err(e) => {
                self.state().loading = false;
                self.emit(FlowEvent::Loading { active: false });
                tracing::warn!(topic, error = %e, "study guide generation failed");
                self.alert(STUDY_GUIDE_ALERT);
                return Err(e.into());
            }
        };

        let topic = guide.topic.clone();
        {
            let mut state = self.state();
            state.loading = false;
            state.guide = Some(guide);
            state.quiz = None;
            state.boards.clear();
            state.diagrams.clear();
        }
        self.emit(FlowEvent::Loading { active: false });
        self.emit(FlowEvent::GuideReady { topic });
        self.set_view(ViewState::Study);
        self.record_study_session();
        Ok(())
    }

    fn record_study_session(&self) {
        let today = (self.inner.clock)();
        let result = {
            let mut ledger = self.ledger();
            ledger
                .record_study_session(today)
                .map(|moved| moved.then(|| ledger.stats().clone()))
        };

        match result {
            Ok(Some(stats)) => {
                tracing::info!(streak = stats.streak_days, "study streak extended");
                self.emit(FlowEvent::StatsUpdated { stats });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to record study session");
                self.alert(e.to_string());
            }
        }
    }

    /// Header "home" action. The guide and stats stay loaded.
    pub fn go_home(&self) {
        self.state().quiz = None;
        self.set_view(ViewState::Home);
    }

    // === Quiz ===

    /// Switch to the quiz view and request a fresh set of questions.
    pub async fn start_quiz(&self, difficulty: Difficulty) -> Result<QuizView, FlowError> {
        let topic = {
            let mut state = self.state();
            let topic = state.guide()?.topic.clone();
            state.quiz = None;
            state.quiz_loading = true;
            topic
        };
        self.set_view(ViewState::Quiz);
        self.emit(FlowEvent::QuizLoading { active: true });
        tracing::info!(topic = %topic, difficulty = difficulty.as_str(), "generating quiz");

        let result = self
            .inner
            .generator
            .generate_quiz_questions(&topic, difficulty)
            .await;

        match result {
            Ok(session) => {
                let quiz = QuizSessionEngine::new(session);
                let view = QuizView::of(&quiz);
                {
                    let mut state = self.state();
                    state.quiz_loading = false;
                    state.quiz = Some(quiz);
                }
                self.emit(FlowEvent::QuizLoading { active: false });
                self.emit(FlowEvent::QuizReady {
                    questions: view.progress.total,
                });
                Ok(view)
            }
            Err(e) => {
                {
                    let mut state = self.state();
                    state.quiz_loading = false;
                    state.quiz = None;
                }
                self.emit(FlowEvent::QuizLoading { active: false });
                tracing::warn!(topic = %topic, error = %e, "quiz generation failed");
                self.set_view(ViewState::Study);
                self.alert(QUIZ_ALERT);
                Err(e.into())
            }
        }
    }

    fn with_quiz<T>(
        &self,
        f: impl FnOnce(&mut QuizSessionEngine) -> Result<T, SelectionError>,
    ) -> Result<T, FlowError> {
        let mut state = self.state();
        let quiz = state.quiz.as_mut().ok_or(FlowError::NoQuiz)?;
        Ok(f(quiz)?)
    }

    pub fn quiz_view(&self) -> Result<QuizView, FlowError> {
        self.with_quiz(|quiz| Ok(QuizView::of(quiz)))
    }

    pub fn select_option(&self, index: usize, option: usize) -> Result<QuizView, FlowError> {
        self.with_quiz(|quiz| {
            quiz.select_option(index, option)?;
            Ok(QuizView::of(quiz))
        })
    }

    pub fn check_answer(&self, index: usize) -> Result<QuizView, FlowError> {
        self.with_quiz(|quiz| {
            let status = quiz.check_answer(index)?;
            tracing::debug!(index, ?status, "answer checked");
            Ok(QuizView::of(quiz))
        })
    }

    pub fn skip_question(&self, index: usize) -> Result<QuizView, FlowError> {
        self.with_quiz(|quiz| {
            quiz.skip(index)?;
            Ok(QuizView::of(quiz))
        })
    }

    pub fn next_question(&self) -> Result<(NextStep, QuizView), FlowError> {
        self.with_quiz(|quiz| {
            let step = quiz.go_next();
            Ok((step, QuizView::of(quiz)))
        })
    }

    pub fn previous_question(&self) -> Result<QuizView, FlowError> {
        self.with_quiz(|quiz| {
            quiz.go_previous()?;
            Ok(QuizView::of(quiz))
        })
    }

    pub fn jump_to_question(&self, index: usize) -> Result<QuizView, FlowError> {
        self.with_quiz(|quiz| {
            quiz.jump_to(index)?;
            Ok(QuizView::of(quiz))
        })
    }

    /// Record the finished quiz on the ledger and return to the guide.
    pub fn complete_quiz(&self) -> Result<QuizReward, FlowError> {
        let outcome = {
            let state = self.state();
            let quiz = state.quiz.as_ref().ok_or(FlowError::NoQuiz)?;
            quiz.finish().ok_or(FlowError::QuizUnfinished)?
        };
        self.complete_quiz_with(outcome.correct, outcome.total)
    }

    /// Record `correct` out of `total` and return to the guide.
    ///
    /// The quiz is discarded even if the stats could not be saved.
    pub fn complete_quiz_with(&self, correct: usize, total: usize) -> Result<QuizReward, FlowError> {
        self.take_quiz()?;
        let result = {
            let mut ledger = self.ledger();
            ledger
                .record_quiz_completion(correct, total)
                .map(|reward| (reward, ledger.stats().clone()))
        };

        self.set_view(ViewState::Study);

        match result {
            Ok((reward, stats)) => {
                tracing::info!(correct, total, mastered = reward.mastered, "quiz completed");
                self.emit(FlowEvent::QuizResults {
                    outcome: study_core::QuizOutcome { correct, total },
                    points_awarded: reward.points_awarded,
                    mastered: reward.mastered,
                });
                self.emit(FlowEvent::StatsUpdated { stats });
                Ok(reward)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to record quiz completion");
                self.alert(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Abandon the quiz without recording anything.
    pub fn close_quiz(&self) -> Result<(), FlowError> {
        self.take_quiz()?;
        self.set_view(ViewState::Study);
        Ok(())
    }

    /// Remove the running quiz. Fails outside the Quiz view.
    fn take_quiz(&self) -> Result<QuizSessionEngine, FlowError> {
        let mut state = self.state();
        if state.view != ViewState::Quiz {
            return Err(FlowError::NoQuiz);
        }
        state.quiz.take().ok_or(FlowError::NoQuiz)
    }

    // === Stats ===

    pub fn record_mood(&self, score: u8) -> Result<UserStats, FlowError> {
        let stats = {
            let mut ledger = self.ledger();
            ledger.record_mood(score)?;
            ledger.stats().clone()
        };
        self.emit(FlowEvent::StatsUpdated {
            stats: stats.clone(),
        });
        Ok(stats)
    }

    // === Matching ===

    /// The board for a section, dealt on first use.
    pub fn matching_board(&self, section: &str) -> Result<BoardView, FlowError> {
        let mut state = self.state();
        let board = state.board_mut(section)?;
        Ok(BoardView::of(section, board))
    }

    pub fn reset_matching(&self, section: &str) -> Result<BoardView, FlowError> {
        let mut state = self.state();
        let board = state.board_mut(section)?;
        board.reset();
        Ok(BoardView::of(section, board))
    }

    /// Click a tile. A mismatch is reverted after the revert delay.
    pub fn select_tile(
        &self,
        section: &str,
        tile: TileId,
    ) -> Result<(SelectOutcome, BoardView), FlowError> {
        let (outcome, view) = {
            let mut state = self.state();
            let board = state.board_mut(section)?;
            let outcome = board.select_tile(tile)?;
            (outcome, BoardView::of(section, board))
        };

        if let SelectOutcome::Mismatched(revert) = &outcome {
            self.schedule_revert(section.to_string(), *revert);
        }
        Ok((outcome, view))
    }

    fn schedule_revert(&self, section: String, revert: PendingRevert) {
        match Handle::try_current() {
            Ok(handle) => {
                let controller = self.clone();
                let delay = self.inner.revert_delay;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    controller.apply_revert(&section, &revert);
                });
            }
            Err(_) => {
                tracing::warn!("no async runtime, reverting mismatch immediately");
                self.apply_revert(&section, &revert);
            }
        }
    }

    fn apply_revert(&self, section: &str, revert: &PendingRevert) {
        let applied = self
            .state()
            .boards
            .get_mut(section)
            .map(|board| board.apply_revert(revert))
            .unwrap_or(false);

        if applied {
            self.emit(FlowEvent::TileReverted {
                section: section.to_string(),
                tiles: revert.tiles(),
            });
        }
    }

    // === Media ===

    /// Diagram for a section, generating it on first request.
    pub async fn section_diagram(&self, section: &str) -> Result<DiagramView, FlowError> {
        let topic = {
            let mut state = self.state();
            let topic = state.guide()?.topic.clone();
            if state.guide()?.section(section).is_none() {
                return Err(FlowError::UnknownSection(section.to_string()));
            }
            if state.diagrams.image(section).is_some() {
                return Ok(state.diagrams.view(section));
            }
            if !state.diagrams.begin(section) {
                return Err(FlowError::DiagramBusy);
            }
            topic
        };

        tracing::info!(topic = %topic, section, "generating diagram");
        let result = self
            .inner
            .generator
            .generate_diagram_image(&topic, section)
            .await;

        let mut state = self.state();
        match result {
            Ok(bytes) => {
                state.diagrams.finish(section, Some(bytes));
                Ok(state.diagrams.view(section))
            }
            Err(e) => {
                state.diagrams.finish(section, None);
                tracing::warn!(section, error = %e, "diagram generation failed");
                Err(e.into())
            }
        }
    }

    pub fn diagram_view(&self, section: &str) -> DiagramView {
        self.state().diagrams.view(section)
    }

    pub fn toggle_diagram(&self, section: &str) -> DiagramView {
        let mut state = self.state();
        state.diagrams.toggle_hidden(section);
        state.diagrams.view(section)
    }

    /// Speak a section's foundational and clinical text.
    pub async fn read_aloud(&self, section: &str) -> Result<SpeechClip, FlowError> {
        let text = {
            let state = self.state();
            let found = state
                .guide()?
                .section(section)
                .ok_or_else(|| FlowError::UnknownSection(section.to_string()))?;
            format!("{}. {} {}", found.title, found.foundational, found.clinical)
        };

        let pcm = self.inner.generator.generate_speech_audio(&text).await?;
        Ok(SpeechClip::from_pcm(&pcm))
    }

    pub fn generator(&self) -> Arc<dyn ContentGenerator> {
        self.inner.generator.clone()
    }
}
