use askama::Template;
use axum::{
  extract::{Path, State},
  response::Html,
  Form,
};
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::db;
use crate::lessons::{Language, Lesson, Question};
use crate::progression::{self, ProgressionError, QuizOutcome, QuizSubmission};
use crate::state::AppState;

/// One question flattened for rendering
#[derive(Debug, Clone, Default)]
pub struct QuestionView {
  pub index: usize,
  pub kind: &'static str,
  pub prompt: String,
  pub options: Vec<String>,
  /// Clip to play for listen questions
  pub audio_text: String,
  /// Match pairs: left column in pair order, right column shuffled
  pub sources: Vec<String>,
  pub targets: Vec<String>,
}

impl QuestionView {
  fn new(index: usize, question: &Question) -> Self {
    let base = QuestionView {
      index,
      kind: question.kind(),
      ..Default::default()
    };
    match question {
      Question::MultipleChoice(q) | Question::ListenAndChoose(q) => QuestionView {
        prompt: q.question.clone(),
        options: q.options.clone(),
        audio_text: q.audio_text.clone(),
        ..base
      },
      Question::TypeAnswer(q) => QuestionView {
        prompt: q.prompt.clone(),
        ..base
      },
      Question::MatchPairs(q) => QuestionView {
        prompt: q.question.clone(),
        sources: q.pairs.iter().map(|p| p.english.clone()).collect(),
        targets: q.shuffled_targets.clone(),
        ..base
      },
    }
  }
}

#[derive(Template)]
#[template(path = "quiz.html")]
pub struct QuizTemplate<'a> {
  pub language: &'a Language,
  pub lesson: &'a Lesson,
  pub questions: Vec<QuestionView>,
}

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate<'a> {
  pub language: &'a Language,
  pub lesson: &'a Lesson,
  pub outcome: QuizOutcome,
}

fn find_language<'a>(state: &'a AppState, slug: &str) -> Result<&'a Language, ProgressionError> {
  state
    .catalog
    .language(slug)
    .map(|lc| &lc.language)
    .ok_or_else(|| ProgressionError::UnknownLanguage(slug.to_string()))
}

/// GET /lessons/{language}/{lesson_id}/quiz
pub async fn quiz_page(
  State(state): State<AppState>,
  user: AuthUser,
  Path((language, lesson_id)): Path<(String, String)>,
) -> Result<Html<String>, ProgressionError> {
  let lesson = {
    let conn = db::try_lock(&state.db)?;
    progression::open_lesson(&conn, &state.catalog, user.user_id, &language, &lesson_id)?
  };

  let template = QuizTemplate {
    language: find_language(&state, &language)?,
    lesson,
    questions: lesson
      .quiz
      .questions
      .iter()
      .enumerate()
      .map(|(i, q)| QuestionView::new(i, q))
      .collect(),
  };
  Ok(Html(template.render().unwrap_or_default()))
}

/// POST /lessons/{language}/{lesson_id}/quiz - grade and record
pub async fn quiz_submit(
  State(state): State<AppState>,
  user: AuthUser,
  Path((language, lesson_id)): Path<(String, String)>,
  Form(form): Form<HashMap<String, String>>,
) -> Result<Html<String>, ProgressionError> {
  let lesson = state
    .catalog
    .lesson(&language, &lesson_id)
    .ok_or_else(|| ProgressionError::UnknownLesson {
      language: language.clone(),
      lesson_id: lesson_id.clone(),
    })?;
  let submission = QuizSubmission::from_form(&form, lesson.question_count());

  let outcome = {
    let conn = db::try_lock(&state.db)?;
    progression::submit_quiz(
      &conn,
      &state.catalog,
      user.user_id,
      &language,
      &lesson_id,
      &submission,
    )?
  };

  let template = ResultsTemplate {
    language: find_language(&state, &language)?,
    lesson,
    outcome,
  };
  Ok(Html(template.render().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::serbian_catalog;

  #[test]
  fn test_question_views() {
    let catalog = serbian_catalog(1);
    let lesson = catalog.lesson("serbian", "lesson1").unwrap();
    let views: Vec<_> = lesson
      .quiz
      .questions
      .iter()
      .enumerate()
      .map(|(i, q)| QuestionView::new(i, q))
      .collect();

    assert_eq!(views[0].kind, "multiple_choice");
    assert_eq!(views[0].options, ["hvala", "zdravo"]);
    // Listen question plays the linked word
    assert_eq!(views[1].audio_text, "zdravo");
    assert_eq!(views[2].prompt, "Thank you");
    assert_eq!(views[3].index, 3);
    assert_eq!(views[3].sources, ["yes", "no"]);
    assert_eq!(views[3].targets, ["ne", "da"]);
  }
}
