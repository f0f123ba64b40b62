//! Pronunciation audio: a content-addressed cache in front of remote TTS.
//!
//! Lookup order for `(text, lang)`:
//!
//! 1. Override: hand-recorded `<static>/audio/<key>.mp3`
//! 2. Cache: previously synthesized `<data>/tts_cache/<key>.mp3`
//! 3. Remote synthesis, only when a [`SpeechSynthesizer`] is configured
//!
//! Tiers 1 and 2 are plain file reads with no locking. Tier 3 runs under
//! one process-wide mutex and re-checks the cache after acquiring it, so
//! requests queued behind an in-flight synthesis pick up its result
//! instead of calling the remote service again. Failures are logged and
//! never cached.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::TTS_TIMEOUT_SECS;
use crate::paths;

pub const AUDIO_MPEG: &str = "audio/mpeg";

const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Content address for a clip: hex of the first 16 bytes of
/// SHA-256(`lang:text`). Also the file stem in both local tiers.
pub fn cache_key(text: &str, lang: &str) -> String {
    let digest = Sha256::digest(format!("{lang}:{text}").as_bytes());
    hex::encode(&digest[..16])
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("TTS request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TTS API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decode audio: {0}")]
    Decode(#[from] base64::DecodeError),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("text parameter required")]
    EmptyText,
    #[error("audio unavailable")]
    Unavailable,
}

/// Remote text-to-speech backend
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in `lang`, returning MP3 bytes
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// Google Cloud Text-to-Speech over its REST API
pub struct GoogleTts {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

impl GoogleTts {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TTS_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: GOOGLE_TTS_URL.to_string(),
        })
    }

    /// Voice locale: Serbian maps to "sr-RS", other codes pass through
    fn voice_language(lang: &str) -> &str {
        if lang.is_empty() || lang == "sr" {
            "sr-RS"
        } else {
            lang
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, SynthesisError> {
        let body = serde_json::json!({
            "input": { "text": text },
            "voice": {
                "languageCode": Self::voice_language(lang),
                "ssmlGender": "FEMALE",
            },
            "audioConfig": { "audioEncoding": "MP3" },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SynthesizeResponse = response.json().await?;
        Ok(base64::engine::general_purpose::STANDARD.decode(parsed.audio_content)?)
    }
}

/// Three-tier audio store shared by all requests
pub struct AudioCache {
    override_dir: PathBuf,
    cache_dir: PathBuf,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    synth_lock: Mutex<()>,
}

impl AudioCache {
    /// `synthesizer: None` disables tier 3; the local tiers still serve.
    pub fn new(
        override_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        let cache_dir = cache_dir.into();
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            tracing::warn!("Could not create TTS cache {}: {}", cache_dir.display(), e);
        }
        Self {
            override_dir: override_dir.into(),
            cache_dir,
            synthesizer,
            synth_lock: Mutex::new(()),
        }
    }

    pub fn has_synthesizer(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Resolve audio for `text` through the tiers, returning bytes and MIME type
    pub async fn get_audio(&self, text: &str, lang: &str) -> Result<(Vec<u8>, &'static str), AudioError> {
        if text.is_empty() {
            return Err(AudioError::EmptyText);
        }

        let file_name = paths::audio_file_name(&cache_key(text, lang));
        let override_path = self.override_dir.join(&file_name);
        let cache_path = self.cache_dir.join(&file_name);

        if let Some(data) = read_tier(&override_path).await {
            return Ok((data, AUDIO_MPEG));
        }
        if let Some(data) = read_tier(&cache_path).await {
            return Ok((data, AUDIO_MPEG));
        }

        let Some(synthesizer) = &self.synthesizer else {
            return Err(AudioError::Unavailable);
        };

        let _guard = self.synth_lock.lock().await;

        // Someone ahead of us in the queue may have filled it
        if let Some(data) = read_tier(&cache_path).await {
            return Ok((data, AUDIO_MPEG));
        }

        match synthesizer.synthesize(text, lang).await {
            Ok(data) => {
                if let Err(e) = store(&cache_path, &data).await {
                    tracing::warn!("Failed to cache TTS audio {}: {}", cache_path.display(), e);
                }
                Ok((data, AUDIO_MPEG))
            }
            Err(e) => {
                tracing::warn!("TTS API error for {:?}: {}", text, e);
                Err(AudioError::Unavailable)
            }
        }
    }
}

async fn read_tier(path: &Path) -> Option<Vec<u8>> {
    tokio::fs::read(path).await.ok()
}

/// Write to a sibling temp file, then rename into place
async fn store(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("mp3.tmp");
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await
}
