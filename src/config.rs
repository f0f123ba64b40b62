//! Application configuration.
//!
//! Values are resolved once at startup with priority
//! `config.toml` > environment (`.env` honoured) > defaults, and the
//! resulting [`Config`] is handed to everything that needs it.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== File Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server: Option<ServerSection>,
    storage: Option<StorageSection>,
    content: Option<ContentSection>,
    tts: Option<TtsSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageSection {
    data_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentSection {
    lessons_dir: Option<String>,
    static_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TtsSection {
    api_key: Option<String>,
    default_language: Option<String>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Holds speakeasy.db and the tts_cache directory
    pub data_dir: PathBuf,
    /// One sub-directory per language
    pub lessons_dir: PathBuf,
    /// Served under /static; override audio lives in `audio/`
    pub static_dir: PathBuf,
    /// Remote synthesis credential; `None` disables the remote tier
    pub tts_api_key: Option<String>,
    pub default_tts_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("."),
            lessons_dir: PathBuf::from("lessons"),
            static_dir: PathBuf::from("static"),
            tts_api_key: None,
            default_tts_language: DEFAULT_TTS_LANGUAGE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration: config.toml > .env / environment > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        let file = match std::fs::read_to_string("config.toml") {
            Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
                Ok(parsed) => {
                    tracing::info!("Using config.toml");
                    parsed
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed config.toml: {}", e);
                    FileConfig::default()
                }
            },
            Err(_) => FileConfig::default(),
        };

        Self::resolve(file, |key| std::env::var(key).ok())
    }

    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let server = file.server.unwrap_or_default();
        let storage = file.storage.unwrap_or_default();
        let content = file.content.unwrap_or_default();
        let tts = file.tts.unwrap_or_default();

        let port = server
            .port
            .or_else(|| env("PORT").and_then(|p| p.parse().ok()))
            .unwrap_or(defaults.port);

        let data_dir = storage
            .data_dir
            .or_else(|| env("SPEAKEASY_DATA_DIR"))
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let lessons_dir = content
            .lessons_dir
            .or_else(|| env("SPEAKEASY_LESSONS_DIR"))
            .map(PathBuf::from)
            .unwrap_or(defaults.lessons_dir);

        let static_dir = content
            .static_dir
            .or_else(|| env("SPEAKEASY_STATIC_DIR"))
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let tts_api_key = tts
            .api_key
            .or_else(|| env("GOOGLE_TTS_API_KEY"))
            .filter(|key| !key.trim().is_empty());

        let default_tts_language = tts
            .default_language
            .or_else(|| env("SPEAKEASY_TTS_LANG"))
            .unwrap_or(defaults.default_tts_language);

        Self {
            port,
            data_dir,
            lessons_dir,
            static_dir,
            tts_api_key,
            default_tts_language,
        }
    }

    /// Full address to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", SERVER_ADDR, self.port)
    }
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8282;

// ==================== Session Configuration ====================

/// Session lifetime in hours (1 week), also the cookie max-age
pub const SESSION_DURATION_HOURS: i64 = 24 * 7;

/// Probability threshold for the expired-session sweep on create (0-255)
/// Value of 25 means ~10% chance (25/256)
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

// ==================== Account Configuration ====================

pub const MIN_PASSWORD_LEN: usize = 6;

// ==================== Quiz Configuration ====================

/// Minimum score (percent) that completes a lesson
pub const PASS_SCORE: u8 = 70;

// ==================== Audio Configuration ====================

/// Language used when the audio endpoint gets no `lang`
pub const DEFAULT_TTS_LANGUAGE: &str = "sr";

/// Upper bound on a single remote synthesis call
pub const TTS_TIMEOUT_SECS: u64 = 10;

/// Downstream cache lifetime for served audio
pub const AUDIO_CACHE_MAX_AGE_SECS: u32 = 86_400;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = Config::resolve(FileConfig::default(), env_from(&[]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.default_tts_language, "sr");
        assert!(config.tts_api_key.is_none());
        assert_eq!(config.bind_addr(), "0.0.0.0:8282");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = Config::resolve(
            FileConfig::default(),
            env_from(&[
                ("PORT", "9000"),
                ("SPEAKEASY_DATA_DIR", "/tmp/speakeasy"),
                ("GOOGLE_TTS_API_KEY", "secret"),
            ]),
        );
        assert_eq!(config.port, 9000);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/speakeasy"));
        assert_eq!(config.tts_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_file_wins_over_env() {
        let file: FileConfig = toml::from_str(
            r#"
            [server]
            port = 4000

            [tts]
            default_language = "hr"
            "#,
        )
        .unwrap();
        let config = Config::resolve(
            file,
            env_from(&[("PORT", "9000"), ("SPEAKEASY_TTS_LANG", "id")]),
        );
        assert_eq!(config.port, 4000);
        assert_eq!(config.default_tts_language, "hr");
    }

    #[test]
    fn test_blank_api_key_disables_remote_tier() {
        let config = Config::resolve(
            FileConfig::default(),
            env_from(&[("GOOGLE_TTS_API_KEY", "  ")]),
        );
        assert!(config.tts_api_key.is_none());
    }
}
