//! Quiz session state machine.
//!
//! Each question moves from unanswered (optionally through skipped) to a
//! graded status. Graded questions are final. Navigation runs over the fixed
//! question order; finishing the last question sends the player back to the
//! first skipped question until none remain.

use crate::error::SelectionError;
use crate::types::{QuizQuestion, QuizSession};
use serde::{Deserialize, Serialize};

/// Per-question progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Unanswered,
    Skipped,
    Correct,
    Incorrect,
}

impl Default for QuestionStatus {
    fn default() -> Self {
        Self::Unanswered
    }
}

impl QuestionStatus {
    /// Correct and incorrect are final.
    pub fn is_graded(self) -> bool {
        matches!(self, Self::Correct | Self::Incorrect)
    }
}

/// Mutable state for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionState {
    pub status: QuestionStatus,
    pub selected_option: Option<usize>,
}

/// Where `go_next` moved the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "index", rename_all = "snake_case")]
pub enum NextStep {
    /// Moved to the following question.
    Advanced(usize),
    /// Jumped back to the first skipped question.
    ReviewSkipped(usize),
    /// Every question is settled; the results view is showing.
    Results,
}

/// Final score of a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub correct: usize,
    pub total: usize,
}

impl QuizOutcome {
    /// Score as a whole percentage (0 for an empty quiz).
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.correct as u128 * 100 / self.total as u128) as u32
    }
}

/// Tallies and position, for progress bars and the question navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizProgress {
    pub current_index: usize,
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
    pub answered: usize,
    pub showing_results: bool,
}

/// State machine over a fixed list of questions.
#[derive(Debug, Clone, Default)]
pub struct QuizSessionEngine {
    questions: Vec<QuizQuestion>,
    states: Vec<QuestionState>,
    current: usize,
    showing_results: bool,
}

impl QuizSessionEngine {
    pub fn new(session: QuizSession) -> Self {
        let mut engine = Self::default();
        engine.load_session(session.questions);
        engine
    }

    /// Load a fresh set of questions, discarding all progress.
    pub fn load_session(&mut self, questions: Vec<QuizQuestion>) {
        for (index, question) in questions.iter().enumerate() {
            if !question.has_valid_answer() {
                tracing::warn!(
                    index,
                    correct_answer = question.correct_answer,
                    options = question.options.len(),
                    "quiz question has an out-of-range correct answer"
                );
            }
        }

        self.states = vec![QuestionState::default(); questions.len()];
        self.questions = questions;
        self.current = 0;
        self.showing_results = false;
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Question states, index-aligned with `questions()`.
    pub fn states(&self) -> &[QuestionState] {
        &self.states
    }

    pub fn state(&self, index: usize) -> Option<&QuestionState> {
        self.states.get(index)
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current)
    }

    pub fn current_state(&self) -> Option<&QuestionState> {
        self.states.get(self.current)
    }

    pub fn is_showing_results(&self) -> bool {
        self.showing_results
    }

    fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.questions.len()
    }

    fn check_index(&self, index: usize) -> Result<(), SelectionError> {
        if index < self.questions.len() {
            Ok(())
        } else {
            Err(SelectionError::QuestionOutOfRange {
                index,
                len: self.questions.len(),
            })
        }
    }

    /// Pick an option without grading it.
    pub fn select_option(&mut self, index: usize, option: usize) -> Result<(), SelectionError> {
        self.check_index(index)?;
        if self.states[index].status.is_graded() {
            return Err(SelectionError::AlreadyGraded(index));
        }
        if option >= self.questions[index].options.len() {
            return Err(SelectionError::OptionOutOfRange { index, option });
        }

        self.states[index].selected_option = Some(option);
        Ok(())
    }

    /// Grade the selected option. Grading is one-way.
    pub fn check_answer(&mut self, index: usize) -> Result<QuestionStatus, SelectionError> {
        self.check_index(index)?;
        let state = &mut self.states[index];
        if state.status.is_graded() {
            return Err(SelectionError::AlreadyGraded(index));
        }
        let selected = state
            .selected_option
            .ok_or(SelectionError::NoOptionSelected(index))?;

        state.status = if selected == self.questions[index].correct_answer {
            QuestionStatus::Correct
        } else {
            QuestionStatus::Incorrect
        };
        Ok(state.status)
    }

    /// Skip a question, clearing its selection, and move past it.
    pub fn skip(&mut self, index: usize) -> Result<(), SelectionError> {
        self.check_index(index)?;
        if self.states[index].status.is_graded() {
            return Err(SelectionError::AlreadyGraded(index));
        }

        self.states[index] = QuestionState {
            status: QuestionStatus::Skipped,
            selected_option: None,
        };
        if !self.is_last(index) {
            self.current = index + 1;
        }
        Ok(())
    }

    /// First skipped question in question order.
    pub fn first_skipped(&self) -> Option<usize> {
        self.states
            .iter()
            .position(|s| s.status == QuestionStatus::Skipped)
    }

    /// Advance, revisit skipped questions, or show results.
    pub fn go_next(&mut self) -> NextStep {
        if !self.is_last(self.current) {
            self.current += 1;
            return NextStep::Advanced(self.current);
        }

        match self.first_skipped() {
            Some(index) => {
                self.current = index;
                NextStep::ReviewSkipped(index)
            }
            None => {
                self.showing_results = true;
                NextStep::Results
            }
        }
    }

    /// Step back from a graded question.
    pub fn go_previous(&mut self) -> Result<usize, SelectionError> {
        let graded = self
            .current_state()
            .map_or(false, |s| s.status.is_graded());
        if !graded {
            return Err(SelectionError::NotGraded(self.current));
        }

        self.current = self.current.saturating_sub(1);
        Ok(self.current)
    }

    /// Jump straight to a question (question navigator).
    pub fn jump_to(&mut self, index: usize) -> Result<(), SelectionError> {
        self.check_index(index)?;
        self.current = index;
        Ok(())
    }

    fn count(&self, status: QuestionStatus) -> usize {
        self.states.iter().filter(|s| s.status == status).count()
    }

    pub fn correct_count(&self) -> usize {
        self.count(QuestionStatus::Correct)
    }

    pub fn incorrect_count(&self) -> usize {
        self.count(QuestionStatus::Incorrect)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(QuestionStatus::Skipped)
    }

    pub fn answered_count(&self) -> usize {
        self.correct_count() + self.incorrect_count()
    }

    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            current_index: self.current,
            total: self.questions.len(),
            correct: self.correct_count(),
            incorrect: self.incorrect_count(),
            skipped: self.skipped_count(),
            answered: self.answered_count(),
            showing_results: self.showing_results,
        }
    }

    /// Final score, available once no question is left skipped.
    pub fn finish(&self) -> Option<QuizOutcome> {
        if self.skipped_count() > 0 {
            return None;
        }
        Some(QuizOutcome {
            correct: self.correct_count(),
            total: self.questions.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn question(correct_answer: usize) -> QuizQuestion {
        QuizQuestion {
            question: format!("Question with answer {correct_answer}"),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer,
            explanation: "Because.".to_string(),
        }
    }

    fn engine(n: usize) -> QuizSessionEngine {
        QuizSessionEngine::new(QuizSession {
            questions: (0..n).map(|i| question(i % 4)).collect(),
        })
    }

    fn answer(engine: &mut QuizSessionEngine, index: usize, option: usize) -> QuestionStatus {
        engine.select_option(index, option).unwrap();
        engine.check_answer(index).unwrap()
    }

    #[test]
    fn test_load_session_resets_state() {
        let mut quiz = engine(3);
        answer(&mut quiz, 0, 0);
        quiz.go_next();

        quiz.load_session(vec![question(1), question(2)]);

        assert_eq!(quiz.states().len(), 2);
        assert!(quiz.states().iter().all(|s| *s == QuestionState::default()));
        assert_eq!(quiz.current_index(), 0);
        assert!(!quiz.is_showing_results());
    }

    #[test]
    fn test_check_requires_selection() {
        let mut quiz = engine(2);
        assert_eq!(quiz.check_answer(0), Err(SelectionError::NoOptionSelected(0)));
        assert_eq!(quiz.state(0).unwrap().status, QuestionStatus::Unanswered);
    }

    #[test]
    fn test_select_does_not_grade() {
        let mut quiz = engine(2);
        quiz.select_option(0, 2).unwrap();
        quiz.select_option(0, 0).unwrap();
        assert_eq!(
            *quiz.state(0).unwrap(),
            QuestionState {
                status: QuestionStatus::Unanswered,
                selected_option: Some(0),
            }
        );
    }

    #[test]
    fn test_grading_is_final() {
        let mut quiz = engine(2);
        assert_eq!(answer(&mut quiz, 1, 3), QuestionStatus::Incorrect);

        assert_eq!(quiz.select_option(1, 1), Err(SelectionError::AlreadyGraded(1)));
        assert_eq!(quiz.check_answer(1), Err(SelectionError::AlreadyGraded(1)));
        assert_eq!(quiz.skip(1), Err(SelectionError::AlreadyGraded(1)));
        assert_eq!(quiz.state(1).unwrap().status, QuestionStatus::Incorrect);
        assert_eq!(quiz.state(1).unwrap().selected_option, Some(3));
    }

    #[test]
    fn test_option_and_question_bounds() {
        let mut quiz = engine(1);
        assert_eq!(
            quiz.select_option(0, 4),
            Err(SelectionError::OptionOutOfRange { index: 0, option: 4 })
        );
        assert_eq!(
            quiz.select_option(1, 0),
            Err(SelectionError::QuestionOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            quiz.jump_to(5),
            Err(SelectionError::QuestionOutOfRange { index: 5, len: 1 })
        );
    }

    #[test]
    fn test_out_of_range_correct_answer_grades_incorrect() {
        let mut quiz = QuizSessionEngine::new(QuizSession {
            questions: vec![question(7)],
        });
        assert_eq!(answer(&mut quiz, 0, 3), QuestionStatus::Incorrect);
    }

    #[test]
    fn test_skip_clears_selection_and_advances() {
        let mut quiz = engine(3);
        quiz.select_option(0, 1).unwrap();
        quiz.skip(0).unwrap();

        assert_eq!(
            *quiz.state(0).unwrap(),
            QuestionState {
                status: QuestionStatus::Skipped,
                selected_option: None,
            }
        );
        assert_eq!(quiz.current_index(), 1);

        quiz.jump_to(2).unwrap();
        quiz.skip(2).unwrap();
        assert_eq!(quiz.current_index(), 2);
    }

    #[test]
    fn test_skipped_question_can_be_answered_later() {
        let mut quiz = engine(2);
        quiz.skip(0).unwrap();
        assert_eq!(quiz.check_answer(0), Err(SelectionError::NoOptionSelected(0)));
        assert_eq!(answer(&mut quiz, 0, 0), QuestionStatus::Correct);
        assert_eq!(quiz.skipped_count(), 0);
    }

    #[test]
    fn test_go_next_shows_results_without_skips() {
        let mut quiz = engine(2);
        assert_eq!(quiz.go_next(), NextStep::Advanced(1));
        assert_eq!(quiz.go_next(), NextStep::Results);
        assert!(quiz.is_showing_results());
    }

    #[test]
    fn test_go_next_returns_to_first_skipped_in_order() {
        let mut quiz = engine(4);
        // visit order: 2 then 0 are skipped, but 0 comes first
        quiz.jump_to(2).unwrap();
        quiz.skip(2).unwrap();
        quiz.jump_to(0).unwrap();
        quiz.skip(0).unwrap();
        quiz.jump_to(3).unwrap();

        assert_eq!(quiz.go_next(), NextStep::ReviewSkipped(0));
        assert_eq!(quiz.current_index(), 0);
        assert!(!quiz.is_showing_results());
    }

    #[test]
    fn test_go_previous_only_from_graded() {
        let mut quiz = engine(3);
        quiz.go_next();
        assert_eq!(quiz.go_previous(), Err(SelectionError::NotGraded(1)));

        answer(&mut quiz, 1, 1);
        assert_eq!(quiz.go_previous(), Ok(0));

        answer(&mut quiz, 0, 0);
        assert_eq!(quiz.go_previous(), Ok(0));
    }

    #[test]
    fn test_five_question_review_scenario() {
        let mut quiz = engine(5); // answers: 0, 1, 2, 3, 0

        assert_eq!(answer(&mut quiz, 0, 0), QuestionStatus::Correct);
        quiz.go_next();
        quiz.skip(1).unwrap();
        assert_eq!(quiz.current_index(), 2);
        assert_eq!(answer(&mut quiz, 2, 0), QuestionStatus::Incorrect);
        quiz.go_next();
        quiz.skip(3).unwrap();
        assert_eq!(quiz.current_index(), 4);
        assert_eq!(answer(&mut quiz, 4, 0), QuestionStatus::Correct);

        assert_eq!(quiz.finish(), None);
        assert_eq!(quiz.go_next(), NextStep::ReviewSkipped(1));

        assert_eq!(answer(&mut quiz, 1, 1), QuestionStatus::Correct);
        quiz.jump_to(3).unwrap();
        assert_eq!(answer(&mut quiz, 3, 3), QuestionStatus::Correct);

        assert_eq!(quiz.correct_count(), 4);
        assert_eq!(quiz.incorrect_count(), 1);
        assert_eq!(quiz.skipped_count(), 0);
        assert_eq!(quiz.answered_count(), 5);

        quiz.jump_to(4).unwrap();
        assert_eq!(quiz.go_next(), NextStep::Results);
        assert_eq!(
            quiz.finish(),
            Some(QuizOutcome {
                correct: 4,
                total: 5
            })
        );
    }

    #[test]
    fn test_scenario_with_wrong_review_answers() {
        let mut quiz = engine(5);

        answer(&mut quiz, 0, 0);
        quiz.go_next();
        quiz.skip(1).unwrap();
        answer(&mut quiz, 2, 3);
        quiz.go_next();
        quiz.skip(3).unwrap();
        answer(&mut quiz, 4, 0);
        quiz.go_next();

        // Q2 answered correctly, Q4 answered incorrectly
        answer(&mut quiz, 1, 1);
        quiz.jump_to(3).unwrap();
        answer(&mut quiz, 3, 0);

        let progress = quiz.progress();
        assert_eq!(progress.correct, 3);
        assert_eq!(progress.incorrect, 2);
        assert_eq!(progress.skipped, 0);
        assert_eq!(progress.answered, 5);
    }

    #[test]
    fn test_empty_session_goes_to_results() {
        let mut quiz = QuizSessionEngine::new(QuizSession::default());
        assert_eq!(quiz.current_question(), None);
        assert_eq!(quiz.go_next(), NextStep::Results);
        assert_eq!(quiz.finish(), Some(QuizOutcome { correct: 0, total: 0 }));
    }

    #[test]
    fn test_outcome_percentage() {
        assert_eq!(QuizOutcome { correct: 4, total: 5 }.percentage(), 80);
        assert_eq!(QuizOutcome { correct: 0, total: 0 }.percentage(), 0);
        let huge = QuizOutcome {
            correct: usize::MAX,
            total: usize::MAX,
        };
        assert_eq!(huge.percentage(), 100);
    }
}
