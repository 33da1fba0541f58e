//! Core types shared by the study engines and the companion app.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A generated study guide for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGuide {
    pub topic: String,
    pub overview: String,
    pub sections: Vec<Section>,
    /// Follow-up topics suggested by the generator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_topics: Vec<String>,
}

impl StudyGuide {
    /// Find a section by its title.
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

/// One section of a study guide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    /// Anatomy, embryology or physiology background.
    pub foundational: String,
    /// Clinical application of the foundational material.
    pub clinical: String,
    /// Diagram source (Mermaid) if the generator produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub mnemonics: Vec<String>,
    #[serde(default)]
    pub matching_pairs: Vec<MatchingPair>,
}

/// A term and the definition it must be matched with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPair {
    pub term: String,
    pub definition: String,
}

impl MatchingPair {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

/// An ordered set of quiz questions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuizSession {
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_answer: usize,
    pub explanation: String,
}

impl QuizQuestion {
    /// Whether `correct_answer` points at an existing option.
    pub fn has_valid_answer(&self) -> bool {
        self.correct_answer < self.options.len()
    }
}

/// Requested quiz difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

impl Difficulty {
    /// Get the difficulty name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Top-level view of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Home,
    Study,
    Quiz,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::Home
    }
}

/// Cumulative, persisted user statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub points: u64,
    pub streak_days: u32,
    pub topics_mastered: u32,
    pub last_study_date: NaiveDate,
    #[serde(default)]
    pub mood_score: Option<u8>,
}

impl UserStats {
    /// Zeroed statistics with the study date set to `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            points: 0,
            streak_days: 0,
            topics_mastered: 0,
            last_study_date: today,
            mood_score: None,
        }
    }
}
