//! Lesson progression engine.
//!
//! Drives the per-user, per-lesson state machine
//! `locked → available → in_progress → completed` from lesson views and
//! quiz submissions, and aggregates progress for the lesson list and the
//! dashboard.
//!
//! The engine keeps no state of its own. Every operation takes the
//! immutable [`Catalog`] plus a connection, and all read-modify-write
//! steps are single upserts (see [`crate::db::lesson_progress`]).

use rusqlite::Connection;
use std::collections::HashMap;
use thiserror::Error;

use crate::db::{self, DbLockError, LessonStatus};
use crate::grading;
use crate::lessons::{Catalog, LanguageCatalog, Lesson};

#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error("unknown language {0:?}")]
    UnknownLanguage(String),
    #[error("unknown lesson {lesson_id:?} in {language:?}")]
    UnknownLesson { language: String, lesson_id: String },
    #[error("lesson {lesson_id:?} in {language:?} is locked")]
    LessonLocked { language: String, lesson_id: String },
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error(transparent)]
    Lock(#[from] DbLockError),
}

pub type Result<T> = std::result::Result<T, ProgressionError>;

/// Raw quiz answers as submitted by the quiz form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSubmission {
    /// Answer for question `i` at index `i`; missing answers grade as wrong
    pub answers: Vec<String>,
    /// Number of questions the client rendered, if it said
    pub total: Option<usize>,
}

impl QuizSubmission {
    /// Read `answer-{i}` fields for every question plus the optional `total`
    pub fn from_form(form: &HashMap<String, String>, question_count: usize) -> Self {
        let answers = (0..question_count)
            .map(|i| form.get(&format!("answer-{i}")).cloned().unwrap_or_default())
            .collect();
        let total = form
            .get("total")
            .and_then(|t| t.trim().parse::<usize>().ok())
            .filter(|&t| t > 0);
        Self { answers, total }
    }

    /// Questions to grade: the client's total, capped at the lesson size
    fn graded_count(&self, question_count: usize) -> usize {
        self.total.map_or(question_count, |t| t.min(question_count))
    }
}

/// What a quiz submission did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: u8,
    pub correct: usize,
    pub total: usize,
    pub passed: bool,
    pub status: LessonStatus,
    pub best_score: u8,
    pub attempts: u32,
    /// Successor lesson, only when passed
    pub next_lesson_id: Option<String>,
}

impl QuizOutcome {
    pub fn is_perfect(&self) -> bool {
        self.score >= 100
    }

    pub fn is_excellent(&self) -> bool {
        self.score >= 90
    }

    pub fn is_half_way(&self) -> bool {
        self.score >= 50
    }
}

/// One row of the lesson list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub illustration: String,
    pub status: LessonStatus,
    pub best_score: u8,
}

#[derive(Debug, Clone)]
pub struct LessonOverview {
    pub items: Vec<LessonListItem>,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSummary {
    pub slug: String,
    pub display_name: String,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub languages: Vec<LanguageSummary>,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    /// Mean best score over completed lessons, 0 when none
    pub average_score: u8,
    pub words_learned: usize,
}

/// Whole-number percentage, rounded down
pub fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    (part.min(whole) * 100 / whole) as u8
}

fn language<'c>(catalog: &'c Catalog, slug: &str) -> Result<&'c LanguageCatalog> {
    catalog
        .language(slug)
        .ok_or_else(|| ProgressionError::UnknownLanguage(slug.to_string()))
}

fn lesson<'c>(catalog: &'c Catalog, slug: &str, lesson_id: &str) -> Result<&'c Lesson> {
    language(catalog, slug)?
        .lesson(lesson_id)
        .ok_or_else(|| ProgressionError::UnknownLesson {
            language: slug.to_string(),
            lesson_id: lesson_id.to_string(),
        })
}

/// Seed progress rows for every language: order 1 available, the rest locked.
///
/// Existing rows are left alone, so this is safe to call again.
pub fn initialize_user(conn: &Connection, catalog: &Catalog, user_id: i64) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for language in catalog.languages() {
        for lesson in language.lessons() {
            db::seed_lesson_progress(
                &tx,
                user_id,
                &language.language.slug,
                &lesson.id,
                LessonStatus::initial(lesson.order),
            )?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Stored status, or the initial status when no row exists yet
pub fn effective_status(
    conn: &Connection,
    user_id: i64,
    language: &str,
    lesson: &Lesson,
) -> Result<LessonStatus> {
    Ok(db::get_lesson_progress(conn, user_id, language, &lesson.id)?
        .map_or_else(|| LessonStatus::initial(lesson.order), |p| p.status))
}

/// Look up a lesson the user is allowed to open
pub fn open_lesson<'c>(
    conn: &Connection,
    catalog: &'c Catalog,
    user_id: i64,
    language: &str,
    lesson_id: &str,
) -> Result<&'c Lesson> {
    let lesson = lesson(catalog, language, lesson_id)?;
    if effective_status(conn, user_id, language, lesson)? == LessonStatus::Locked {
        return Err(ProgressionError::LessonLocked {
            language: language.to_string(),
            lesson_id: lesson_id.to_string(),
        });
    }
    Ok(lesson)
}

/// Open a lesson for reading, marking it in progress
pub fn view_lesson<'c>(
    conn: &Connection,
    catalog: &'c Catalog,
    user_id: i64,
    language: &str,
    lesson_id: &str,
) -> Result<(&'c Lesson, LessonStatus)> {
    let lesson = open_lesson(conn, catalog, user_id, language, lesson_id)?;
    let status = db::mark_lesson_viewed(conn, user_id, language, lesson_id)?;
    Ok((lesson, status))
}

/// Grade a quiz and apply it in one transaction.
///
/// Updates word mastery for linked choice questions, appends the attempt,
/// records the lesson result and, on a pass, unlocks the next lesson if
/// it is still locked.
pub fn submit_quiz(
    conn: &Connection,
    catalog: &Catalog,
    user_id: i64,
    language: &str,
    lesson_id: &str,
    submission: &QuizSubmission,
) -> Result<QuizOutcome> {
    let lesson = open_lesson(conn, catalog, user_id, language, lesson_id)?;
    let total = submission.graded_count(lesson.question_count());

    let tx = conn.unchecked_transaction()?;

    let mut correct = 0;
    for (idx, question) in lesson.quiz.questions.iter().take(total).enumerate() {
        let answer = submission.answers.get(idx).map_or("", String::as_str);
        let graded = grading::grade_question(question, answer);
        if graded.correct {
            correct += 1;
        }
        if let Some(word_id) = graded.word_id {
            db::record_vocab_answer(&tx, user_id, language, &word_id, graded.correct)?;
        }
    }

    let score = grading::score(correct, total);
    let passed = grading::is_passing(score);

    db::insert_quiz_attempt(
        &tx,
        user_id,
        language,
        lesson_id,
        score,
        total as u32,
        correct as u32,
    )?;
    let progress = db::record_quiz_result(&tx, user_id, language, lesson_id, score, passed)?;

    let mut next_lesson_id = None;
    if passed {
        if let Some(next) = language_next(catalog, language, lesson_id) {
            if db::unlock_lesson(&tx, user_id, language, &next.id)? {
                tracing::debug!("Unlocked {}/{} for user {}", language, next.id, user_id);
            }
            next_lesson_id = Some(next.id.clone());
        }
    }

    tx.commit()?;

    tracing::debug!(
        "Quiz {}/{} by user {}: {}/{} = {}%",
        language,
        lesson_id,
        user_id,
        correct,
        total,
        score
    );

    Ok(QuizOutcome {
        score,
        correct,
        total,
        passed,
        status: progress.status,
        best_score: progress.best_score,
        attempts: progress.attempts,
        next_lesson_id,
    })
}

fn language_next<'c>(catalog: &'c Catalog, language: &str, lesson_id: &str) -> Option<&'c Lesson> {
    catalog.language(language)?.next_lesson(lesson_id)
}

/// Every lesson of a language with the user's status and best score
pub fn lesson_overview(
    conn: &Connection,
    catalog: &Catalog,
    user_id: i64,
    language: &str,
) -> Result<LessonOverview> {
    let lang = self::language(catalog, language)?;
    let mut progress: HashMap<String, db::LessonProgress> =
        db::list_lesson_progress(conn, user_id, language)?
            .into_iter()
            .map(|p| (p.lesson_id.clone(), p))
            .collect();

    let items: Vec<LessonListItem> = lang
        .lessons()
        .iter()
        .map(|lesson| {
            let (status, best_score) = match progress.remove(&lesson.id) {
                Some(p) => (p.status, p.best_score),
                None => (LessonStatus::initial(lesson.order), 0),
            };
            LessonListItem {
                id: lesson.id.clone(),
                title: lesson.title.clone(),
                description: lesson.description.clone(),
                order: lesson.order,
                illustration: lesson.illustration.clone(),
                status,
                best_score,
            }
        })
        .collect();

    let completed = items
        .iter()
        .filter(|item| item.status == LessonStatus::Completed)
        .count();
    let total = items.len();

    Ok(LessonOverview {
        items,
        completed,
        total,
        percent: percent(completed, total),
    })
}

/// Cross-language progress summary for the home page
pub fn dashboard(conn: &Connection, catalog: &Catalog, user_id: i64) -> Result<Dashboard> {
    let mut languages = Vec::new();
    let mut completed_all = 0;
    let mut total_all = 0;
    let mut score_sum = 0i64;
    let mut scored_lessons = 0i64;
    let mut words_learned = 0;

    for lang in catalog.languages() {
        let slug = &lang.language.slug;
        let completed = db::count_completed_lessons(conn, user_id, slug)? as usize;
        let total = lang.len();

        let (sum, count) = db::completed_score_totals(conn, user_id, slug)?;
        score_sum += sum;
        scored_lessons += count;
        words_learned += db::count_words_learned(conn, user_id, slug)? as usize;

        completed_all += completed;
        total_all += total;
        languages.push(LanguageSummary {
            slug: slug.clone(),
            display_name: lang.language.display_name.clone(),
            completed,
            total,
            percent: percent(completed, total),
        });
    }

    let average_score = if scored_lessons > 0 {
        (score_sum / scored_lessons) as u8
    } else {
        0
    };

    Ok(Dashboard {
        languages,
        completed: completed_all,
        total: total_all,
        percent: percent(completed_all, total_all),
        average_score,
        words_learned,
    })
}
