pub mod lessons;
pub mod preference;
pub mod quiz;
pub mod tts;

use askama::Template;
use axum::{
  extract::State,
  http::StatusCode,
  response::{Html, IntoResponse, Redirect, Response},
};

use crate::auth::MaybeUser;
use crate::db::{self, LogOnError};
use crate::progression::{self, Dashboard, LanguageSummary, ProgressionError};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
  pub display_name: Option<String>,
  pub languages: Vec<LanguageSummary>,
  /// Present for signed-in users
  pub stats: Option<Dashboard>,
}

impl IntoResponse for ProgressionError {
  fn into_response(self) -> Response {
    match self {
      ProgressionError::UnknownLanguage(_) | ProgressionError::UnknownLesson { .. } => {
        (StatusCode::NOT_FOUND, "Not found").into_response()
      }
      ProgressionError::LessonLocked { language, .. } => {
        Redirect::to(&format!("/lessons/{language}")).into_response()
      }
      other => {
        tracing::error!("{}", other);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
      }
    }
  }
}

/// Language list with lesson counts and no progress
fn anonymous_languages(state: &AppState) -> Vec<LanguageSummary> {
  state
    .catalog
    .languages()
    .into_iter()
    .map(|lang| LanguageSummary {
      slug: lang.language.slug.clone(),
      display_name: lang.language.display_name.clone(),
      completed: 0,
      total: lang.len(),
      percent: 0,
    })
    .collect()
}

/// GET / - dashboard, or the language list when signed out
pub async fn home(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> Html<String> {
  let signed_in = user.and_then(|user| {
    let conn = db::try_lock(&state.db).log_warn("Dashboard unavailable")?;
    let account = db::get_user_by_id(&conn, user.user_id)
      .log_warn("Failed to load user")
      .flatten()?;
    let stats = progression::dashboard(&conn, &state.catalog, user.user_id)
      .log_warn("Failed to build dashboard")?;
    Some((account.display_name, stats))
  });

  let template = match signed_in {
    Some((display_name, stats)) => HomeTemplate {
      display_name: Some(display_name),
      languages: stats.languages.clone(),
      stats: Some(stats),
    },
    None => HomeTemplate {
      display_name: None,
      languages: anonymous_languages(&state),
      stats: None,
    },
  };

  Html(template.render().unwrap_or_default())
}
