//! Quiz commands.

use crate::controller::QuizView;
use crate::state::AppState;
use serde::Serialize;
use study_core::{Difficulty, NextStep, QuizReward};

use super::{ignore_rejected, CommandError};

#[derive(Debug, Serialize)]
pub struct NextResponse {
    pub step: NextStep,
    pub quiz: QuizView,
}

/// Open the quiz view and generate questions.
pub async fn start_quiz(
    difficulty: Option<String>,
    state: &AppState,
) -> Result<QuizView, CommandError> {
    let difficulty = match difficulty.as_deref() {
        None => Difficulty::default(),
        Some(raw) => Difficulty::parse(raw).ok_or_else(|| CommandError {
            message: format!("unknown difficulty: {}", raw),
        })?,
    };
    state
        .controller
        .start_quiz(difficulty)
        .await
        .map_err(Into::into)
}

pub async fn quiz_snapshot(state: &AppState) -> Result<QuizView, CommandError> {
    state.controller.quiz_view().map_err(Into::into)
}

pub async fn select_option(
    index: usize,
    option: usize,
    state: &AppState,
) -> Result<QuizView, CommandError> {
    ignore_rejected(state.controller.select_option(index, option), || {
        state.controller.quiz_view()
    })
}

pub async fn check_answer(index: usize, state: &AppState) -> Result<QuizView, CommandError> {
    ignore_rejected(state.controller.check_answer(index), || {
        state.controller.quiz_view()
    })
}

pub async fn skip_question(index: usize, state: &AppState) -> Result<QuizView, CommandError> {
    ignore_rejected(state.controller.skip_question(index), || {
        state.controller.quiz_view()
    })
}

pub async fn next_question(state: &AppState) -> Result<NextResponse, CommandError> {
    let (step, quiz) = state.controller.next_question()?;
    Ok(NextResponse { step, quiz })
}

pub async fn previous_question(state: &AppState) -> Result<QuizView, CommandError> {
    ignore_rejected(state.controller.previous_question(), || {
        state.controller.quiz_view()
    })
}

pub async fn jump_to_question(index: usize, state: &AppState) -> Result<QuizView, CommandError> {
    ignore_rejected(state.controller.jump_to_question(index), || {
        state.controller.quiz_view()
    })
}

/// Record the results and return to the guide.
pub async fn finish_quiz(state: &AppState) -> Result<QuizReward, CommandError> {
    state.controller.complete_quiz().map_err(Into::into)
}

pub async fn close_quiz(state: &AppState) -> Result<(), CommandError> {
    state.controller.close_quiz().map_err(Into::into)
}
