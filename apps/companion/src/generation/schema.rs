//! Prompts and JSON response schemas sent to the generator.

use serde_json::{json, Value};
use study_core::Difficulty;

/// System instruction for study guide generation.
pub const EDUCATOR_INSTRUCTION: &str = "You are a medical educator specializing in gross anatomy \
and clinical pathology. Make topics stick with high-yield facts, mnemonics and active recall.";

/// Number of questions requested per quiz.
pub const QUIZ_QUESTION_COUNT: usize = 5;

pub fn study_prompt(topic: &str) -> String {
    format!(
        "Create a high-yield clinical anatomy review guide for \"{topic}\". \
         Give a brief overview, then sub-sections. For each sub-section provide: \
         foundational anatomy or physiology including surface landmarks, \
         the clinical application, 2-3 key points, at least one mnemonic, \
         3-4 term/definition matching pairs and, where it helps, a Mermaid diagram. \
         Finish with up to 4 related topics worth studying next."
    )
}

pub fn quiz_prompt(topic: &str, difficulty: Difficulty) -> String {
    let level = match difficulty {
        Difficulty::Easy => "straightforward recall of core facts",
        Difficulty::Medium => "USMLE Step 1 style clinical vignettes",
        Difficulty::Hard => "USMLE Step 2 CK vignettes needing second- and third-order reasoning",
    };
    format!(
        "Generate {QUIZ_QUESTION_COUNT} multiple-choice questions about {topic}. \
         Difficulty: {level}. Each question has 4 or 5 options, the zero-based index \
         of the correct option and a short explanation."
    )
}

pub fn diagram_prompt(topic: &str, section_title: &str) -> String {
    format!(
        "Detailed medical anatomical diagram of {section_title} in the context of {topic}. \
         Clean textbook style illustration, white background, clearly labeled structures."
    )
}

pub fn tutor_instruction(topic: &str) -> String {
    format!(
        "You are a concise medical tutor. The student is studying {topic}. \
         Answer clearly, relate anatomy to clinical practice and cite sources when you search."
    )
}

fn string_array(description: Option<&str>) -> Value {
    let mut schema = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    if let Some(description) = description {
        schema["description"] = json!(description);
    }
    schema
}

/// Response schema matching `StudyGuide`.
pub fn study_guide_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "topic": { "type": "STRING" },
            "overview": { "type": "STRING" },
            "relatedTopics": string_array(Some("Follow-up topics")),
            "sections": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "foundational": { "type": "STRING" },
                        "clinical": { "type": "STRING" },
                        "diagram": { "type": "STRING", "description": "Mermaid diagram source" },
                        "keyPoints": string_array(None),
                        "mnemonics": string_array(Some("Memory aids or acronyms")),
                        "matchingPairs": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "term": { "type": "STRING" },
                                    "definition": { "type": "STRING" }
                                },
                                "required": ["term", "definition"]
                            }
                        }
                    },
                    "required": ["title", "foundational", "clinical", "keyPoints", "mnemonics", "matchingPairs"]
                }
            }
        },
        "required": ["topic", "overview", "sections"]
    })
}

/// Response schema matching `QuizSession`.
pub fn quiz_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING" },
                        "options": string_array(Some("List of 4 or 5 potential answers")),
                        "correctAnswer": {
                            "type": "INTEGER",
                            "description": "Zero-based index of the correct option"
                        },
                        "explanation": { "type": "STRING" }
                    },
                    "required": ["question", "options", "correctAnswer", "explanation"]
                }
            }
        },
        "required": ["questions"]
    })
}
