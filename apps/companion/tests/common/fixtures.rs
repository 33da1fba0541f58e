//! Test data builders.

use study_core::{MatchingPair, QuizQuestion, QuizSession, Section, StudyGuide};

pub fn section(title: &str) -> Section {
    Section {
        title: title.to_string(),
        foundational: format!("{} foundations", title),
        clinical: format!("{} in the clinic", title),
        diagram: None,
        key_points: vec![format!("{} key point", title)],
        mnemonics: vec!["Some Lovers Try Positions".to_string()],
        matching_pairs: vec![
            MatchingPair::new("SA node", "Primary pacemaker"),
            MatchingPair::new("AV node", "Delays conduction"),
            MatchingPair::new("Purkinje fibers", "Fast ventricular conduction"),
        ],
    }
}

pub fn guide(topic: &str) -> StudyGuide {
    StudyGuide {
        topic: topic.to_string(),
        overview: format!("Overview of {}", topic),
        sections: vec![section("Conduction System"), section("Coronary Arteries")],
        related_topics: vec!["Cardiac Cycle".to_string()],
    }
}

/// Questions whose correct option is always the first.
pub fn quiz(len: usize) -> QuizSession {
    QuizSession {
        questions: (0..len)
            .map(|i| QuizQuestion {
                question: format!("Question {}", i + 1),
                options: vec![
                    "Right".to_string(),
                    "Wrong".to_string(),
                    "Also wrong".to_string(),
                    "Still wrong".to_string(),
                ],
                correct_answer: 0,
                explanation: "Because".to_string(),
            })
            .collect(),
    }
}
