pub mod audio;
pub mod auth;
pub mod config;
pub mod db;
pub mod grading;
pub mod handlers;
pub mod lessons;
pub mod paths;
pub mod progression;
pub mod session;
pub mod state;

#[cfg(test)]
pub mod testing;

use axum::{routing::get, routing::post, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full router around a prepared state
pub fn app(state: AppState) -> Router {
  let static_dir = state.config.static_dir.clone();

  Router::new()
    .route("/", get(handlers::home))
    .route("/login", get(auth::login_page).post(auth::login_submit))
    .route("/register", get(auth::register_page).post(auth::register_submit))
    .route("/logout", get(auth::logout).post(auth::logout))
    .route("/lessons/{language}", get(handlers::lessons::lesson_list))
    .route("/lessons/{language}/{lesson_id}", get(handlers::lessons::lesson_view))
    .route(
      "/lessons/{language}/{lesson_id}/quiz",
      get(handlers::quiz::quiz_page).post(handlers::quiz::quiz_submit),
    )
    .route("/api/tts", get(handlers::tts::tts))
    .route("/api/preference/script", post(handlers::preference::set_script))
    .nest_service("/static", ServeDir::new(static_dir))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
