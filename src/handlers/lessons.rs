use askama::Template;
use axum::{
  extract::{Path, State},
  response::Html,
};

use crate::auth::AuthUser;
use crate::db;
use crate::lessons::{Language, Lesson};
use crate::progression::{self, LessonListItem, ProgressionError};
use crate::session::ScriptPreference;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "lesson_list.html")]
pub struct LessonListTemplate<'a> {
  pub language: &'a Language,
  pub lessons: Vec<LessonListItem>,
  pub percent: u8,
}

#[derive(Template)]
#[template(path = "lesson.html")]
pub struct LessonTemplate<'a> {
  pub language: &'a Language,
  pub lesson: &'a Lesson,
  pub script: ScriptPreference,
}

impl LessonTemplate<'_> {
  /// Primary-script forms are hidden only for Cyrillic-only readers
  pub fn show_primary(&self) -> bool {
    !self.language.has_dual_script || self.script != ScriptPreference::Cyrillic
  }

  pub fn show_alt(&self) -> bool {
    self.language.has_dual_script && self.script != ScriptPreference::Latin
  }
}

/// GET /lessons/{language}
pub async fn lesson_list(
  State(state): State<AppState>,
  user: AuthUser,
  Path(language): Path<String>,
) -> Result<Html<String>, ProgressionError> {
  let lang = state
    .catalog
    .language(&language)
    .ok_or_else(|| ProgressionError::UnknownLanguage(language.clone()))?;

  let overview = {
    let conn = db::try_lock(&state.db)?;
    progression::lesson_overview(&conn, &state.catalog, user.user_id, &language)?
  };

  let template = LessonListTemplate {
    language: &lang.language,
    lessons: overview.items,
    percent: overview.percent,
  };
  Ok(Html(template.render().unwrap_or_default()))
}

/// GET /lessons/{language}/{lesson_id} - marks the lesson in progress
pub async fn lesson_view(
  State(state): State<AppState>,
  user: AuthUser,
  Path((language, lesson_id)): Path<(String, String)>,
) -> Result<Html<String>, ProgressionError> {
  let (lang, lesson) = {
    let conn = db::try_lock(&state.db)?;
    let (lesson, _) =
      progression::view_lesson(&conn, &state.catalog, user.user_id, &language, &lesson_id)?;
    (state.catalog.language(&language), lesson)
  };
  let lang = lang.ok_or_else(|| ProgressionError::UnknownLanguage(language.clone()))?;

  let template = LessonTemplate {
    language: &lang.language,
    lesson,
    script: user.script,
  };
  Ok(Html(template.render().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::serbian_catalog;

  #[test]
  fn test_script_visibility() {
    let catalog = serbian_catalog(1);
    let lang = catalog.language("serbian").unwrap();
    let lesson = lang.lesson("lesson1").unwrap();
    let page = |script| LessonTemplate {
      language: &lang.language,
      lesson,
      script,
    };

    assert!(page(ScriptPreference::Both).show_primary());
    assert!(page(ScriptPreference::Both).show_alt());
    assert!(!page(ScriptPreference::Latin).show_alt());
    assert!(!page(ScriptPreference::Cyrillic).show_primary());
    assert!(page(ScriptPreference::Cyrillic).show_alt());
  }
}
