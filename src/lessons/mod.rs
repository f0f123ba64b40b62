//! Lesson content model and the per-language catalog.
//!
//! Lessons are authored as JSON, one file per lesson, grouped into a
//! directory per language. The catalog is loaded once at startup and is
//! read-only afterwards.

pub mod catalog;

use serde::Deserialize;

pub use catalog::{Catalog, CatalogError, LanguageCatalog};

/// A language offered by the app, read from `language.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
    /// URL-safe identifier, e.g. "serbian"
    pub slug: String,
    pub display_name: String,
    /// BCP-47 code handed to speech synthesis, e.g. "sr"
    pub tts_code: String,
    #[serde(default)]
    pub has_dual_script: bool,
    #[serde(default = "default_script_label")]
    pub script_label: String,
    #[serde(default)]
    pub alt_script_label: Option<String>,
}

fn default_script_label() -> String {
    "Latin".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Dense, 1-based unlock sequence within a language
    pub order: u32,
    #[serde(default)]
    pub illustration: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub quiz: Quiz,
}

impl Lesson {
    /// Primary target form of a vocabulary item taught in this lesson
    pub fn find_word(&self, word_id: &str) -> Option<&VocabItem> {
        self.sections
            .iter()
            .flat_map(|section| section.items.iter())
            .find(|item| item.id == word_id)
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }
}

/// Instructional block shown on the lesson page
#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<VocabItem>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VocabItem {
    pub id: String,
    pub english: String,
    #[serde(alias = "serbian_latin")]
    pub target_primary: String,
    #[serde(default, alias = "serbian_cyrillic")]
    pub target_alt: Option<String>,
    #[serde(default)]
    pub pronunciation_hint: String,
    #[serde(default)]
    pub example_sentence: Option<Example>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Example {
    pub english: String,
    #[serde(alias = "serbian_latin")]
    pub target_primary: String,
    #[serde(default, alias = "serbian_cyrillic")]
    pub target_alt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// One quiz question, tagged by `type` in the lesson JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    MultipleChoice(ChoiceQuestion),
    ListenAndChoose(ChoiceQuestion),
    TypeAnswer(TypeAnswerQuestion),
    MatchPairs(MatchPairsQuestion),
}

impl Question {
    pub fn kind(&self) -> &'static str {
        match self {
            Question::MultipleChoice(_) => "multiple_choice",
            Question::ListenAndChoose(_) => "listen_and_choose",
            Question::TypeAnswer(_) => "type_answer",
            Question::MatchPairs(_) => "match_pairs",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceQuestion {
    #[serde(default)]
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: usize,
    /// Vocabulary item whose mastery this question feeds
    #[serde(default)]
    pub word_id: Option<String>,
    /// Text to synthesize for listen questions, filled in at load
    #[serde(skip)]
    pub audio_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeAnswerQuestion {
    #[serde(default)]
    pub prompt: String,
    pub correct_answers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchPairsQuestion {
    #[serde(default)]
    pub question: String,
    pub pairs: Vec<Pair>,
    /// Targets in display order, filled in at load
    #[serde(skip)]
    pub shuffled_targets: Vec<String>,
}

impl MatchPairsQuestion {
    /// Fixed permutation used both when rendering and when grading
    pub fn shuffle_targets(pairs: &[Pair]) -> Vec<String> {
        pairs.iter().rev().map(|p| p.target.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pair {
    pub english: String,
    #[serde(alias = "serbian")]
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_kinds_deserialize() {
        let quiz: Quiz = serde_json::from_str(
            r#"{"questions": [
                {"type": "multiple_choice", "question": "Hello?", "options": ["Zdravo", "Hvala"], "correct": 0, "word_id": "w1"},
                {"type": "listen_and_choose", "options": ["a", "b"], "correct": 1},
                {"type": "type_answer", "prompt": "Thanks", "correct_answers": ["hvala"]},
                {"type": "match_pairs", "pairs": [{"english": "yes", "serbian": "da"}, {"english": "no", "target": "ne"}]}
            ]}"#,
        )
        .unwrap();

        let kinds: Vec<_> = quiz.questions.iter().map(Question::kind).collect();
        assert_eq!(
            kinds,
            ["multiple_choice", "listen_and_choose", "type_answer", "match_pairs"]
        );
        match &quiz.questions[3] {
            Question::MatchPairs(q) => assert_eq!(q.pairs[0].target, "da"),
            other => panic!("unexpected question {:?}", other),
        }
    }

    #[test]
    fn test_shuffle_is_reversal() {
        let pairs = vec![
            Pair { english: "one".into(), target: "jedan".into() },
            Pair { english: "two".into(), target: "dva".into() },
            Pair { english: "three".into(), target: "tri".into() },
        ];
        assert_eq!(
            MatchPairsQuestion::shuffle_targets(&pairs),
            ["tri", "dva", "jedan"]
        );
        // Same input, same permutation
        assert_eq!(
            MatchPairsQuestion::shuffle_targets(&pairs),
            MatchPairsQuestion::shuffle_targets(&pairs)
        );
    }

    #[test]
    fn test_find_word() {
        let lesson: Lesson = serde_json::from_str(
            r#"{"id": "l1", "title": "Greetings", "order": 1, "sections": [
                {"type": "vocabulary", "title": "Words", "items": [
                    {"id": "hello", "english": "hello", "serbian_latin": "zdravo", "serbian_cyrillic": "здраво"}
                ]}
            ]}"#,
        )
        .unwrap();
        let word = lesson.find_word("hello").unwrap();
        assert_eq!(word.target_primary, "zdravo");
        assert_eq!(word.target_alt.as_deref(), Some("здраво"));
        assert!(lesson.find_word("bye").is_none());
        assert_eq!(lesson.question_count(), 0);
    }
}
