use axum::{extract::State, http::StatusCode, Form};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::session::ScriptPreference;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScriptForm {
  #[serde(default)]
  pub mode: String,
}

/// POST /api/preference/script - unknown modes fall back to "both"
pub async fn set_script(
  State(state): State<AppState>,
  user: AuthUser,
  Form(form): Form<ScriptForm>,
) -> StatusCode {
  let script = ScriptPreference::parse_or_default(form.mode.trim());
  state.sessions.set_preference(&user.token, script);
  tracing::debug!("User {} script preference: {}", user.user_id, script);
  StatusCode::OK
}
