use axum::{
  extract::{Query, State},
  http::{header, StatusCode},
  response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::audio::AudioError;
use crate::config::AUDIO_CACHE_MAX_AGE_SECS;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TtsQuery {
  #[serde(default)]
  pub text: String,
  #[serde(default)]
  pub lang: Option<String>,
}

/// GET /api/tts?text=&lang= - pronunciation audio
pub async fn tts(State(state): State<AppState>, Query(query): Query<TtsQuery>) -> Response {
  let lang = query
    .lang
    .filter(|l| !l.is_empty())
    .unwrap_or_else(|| state.config.default_tts_language.clone());

  match state.audio.get_audio(&query.text, &lang).await {
    Ok((data, content_type)) => (
      [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
          header::CACHE_CONTROL,
          format!("public, max-age={AUDIO_CACHE_MAX_AGE_SECS}"),
        ),
      ],
      data,
    )
      .into_response(),
    Err(AudioError::EmptyText) => {
      (StatusCode::BAD_REQUEST, "text parameter required").into_response()
    }
    Err(AudioError::Unavailable) => (StatusCode::INTERNAL_SERVER_ERROR, "TTS error").into_response(),
  }
}
