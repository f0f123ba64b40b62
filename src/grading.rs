//! Quiz grading and the vocabulary mastery estimator.
//!
//! Grading never fails: malformed or out-of-range answers simply count
//! as wrong.

use serde::Deserialize;
use std::collections::HashSet;

use crate::config::PASS_SCORE;
use crate::lessons::{ChoiceQuestion, MatchPairsQuestion, Question, TypeAnswerQuestion};

/// Highest mastery level
pub const MAX_MASTERY: u8 = 5;

/// Result of grading one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub correct: bool,
    /// Vocabulary item to credit or debit, for choice questions that carry one
    pub word_id: Option<String>,
}

/// Grade a raw form answer against a question
pub fn grade_question(question: &Question, answer: &str) -> GradedAnswer {
    match question {
        Question::MultipleChoice(q) | Question::ListenAndChoose(q) => GradedAnswer {
            correct: grade_choice(q, answer),
            word_id: q.word_id.clone().filter(|id| !id.is_empty()),
        },
        Question::TypeAnswer(q) => GradedAnswer {
            correct: grade_typed(q, answer),
            word_id: None,
        },
        Question::MatchPairs(q) => GradedAnswer {
            correct: grade_match(q, answer),
            word_id: None,
        },
    }
}

/// Submitted option index must equal the stored correct index
pub fn grade_choice(question: &ChoiceQuestion, answer: &str) -> bool {
    answer
        .trim()
        .parse::<usize>()
        .map(|idx| idx == question.correct)
        .unwrap_or(false)
}

/// Trimmed, case-insensitive match against any accepted answer
pub fn grade_typed(question: &TypeAnswerQuestion, answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    !answer.is_empty()
        && question
            .correct_answers
            .iter()
            .any(|accepted| accepted.trim().to_lowercase() == answer)
}

/// One submitted pairing: source index → index into the shuffled targets
#[derive(Debug, Deserialize)]
struct Pairing {
    #[serde(alias = "source")]
    english: i64,
    #[serde(alias = "serbian")]
    target: i64,
}

/// Check a JSON list of pairings against the fixed target permutation.
///
/// Every source must be matched exactly once and each chosen shuffled
/// target must equal that source's stored target. Submission order
/// does not matter.
pub fn grade_match(question: &MatchPairsQuestion, answer: &str) -> bool {
    let answer = answer.trim();
    if answer.is_empty() {
        return false;
    }
    let Ok(pairings) = serde_json::from_str::<Vec<Pairing>>(answer) else {
        return false;
    };

    let pairs = &question.pairs;
    let shuffled = &question.shuffled_targets;
    if pairings.len() != pairs.len() {
        return false;
    }

    let mut seen_sources = HashSet::with_capacity(pairings.len());
    for pairing in &pairings {
        let (Ok(source), Ok(target)) = (
            usize::try_from(pairing.english),
            usize::try_from(pairing.target),
        ) else {
            return false;
        };
        let (Some(expected), Some(actual)) = (pairs.get(source), shuffled.get(target)) else {
            return false;
        };
        if expected.target != *actual || !seen_sources.insert(source) {
            return false;
        }
    }
    true
}

/// Percentage of correct answers, rounded half up
pub fn score(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    ((correct * 200 + total) / (total * 2)) as u8
}

pub fn is_passing(score: u8) -> bool {
    score >= PASS_SCORE
}

/// Mastery level (0-5) from cumulative answer counts.
///
/// Gates are checked highest first; the first one satisfied wins.
pub fn mastery_level(times_correct: u32, times_incorrect: u32) -> u8 {
    let total = times_correct + times_incorrect;
    if total == 0 {
        return 0;
    }
    let ratio = f64::from(times_correct) / f64::from(total);

    if ratio >= 0.9 && times_correct >= 5 {
        MAX_MASTERY
    } else if ratio >= 0.8 && times_correct >= 3 {
        4
    } else if ratio >= 0.7 && times_correct >= 2 {
        3
    } else if ratio >= 0.5 {
        2
    } else if times_correct >= 1 {
        1
    } else {
        0
    }
}
