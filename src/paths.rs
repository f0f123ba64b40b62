//! Project path functions - single source of truth for on-disk layout.
//!
//! Every path is derived from a configured root (see [`crate::config::Config`])
//! rather than from process-wide state, so tests can point the whole
//! application at a temporary directory.

use std::path::{Path, PathBuf};

/// SQLite database file inside the data directory
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("speakeasy.db")
}

/// Persistent cache of synthesized audio
pub fn tts_cache_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("tts_cache")
}

/// Hand-recorded audio overrides, served alongside static assets
pub fn audio_override_dir(static_dir: &Path) -> PathBuf {
    static_dir.join("audio")
}

/// Directory holding one language's `language.toml` and lesson files
pub fn language_dir(lessons_dir: &Path, slug: &str) -> PathBuf {
    lessons_dir.join(slug)
}

/// Language descriptor inside a language directory
pub fn language_config_path(language_dir: &Path) -> PathBuf {
    language_dir.join("language.toml")
}

/// File name of one content-addressed audio entry
pub fn audio_file_name(key: &str) -> String {
    format!("{key}.mp3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path_format() {
        let path = db_path(Path::new("data"));
        assert!(path.ends_with("speakeasy.db"));
    }

    #[test]
    fn test_audio_dirs() {
        assert!(tts_cache_dir(Path::new("data")).ends_with("data/tts_cache"));
        assert!(audio_override_dir(Path::new("static")).ends_with("static/audio"));
    }

    #[test]
    fn test_language_paths() {
        let dir = language_dir(Path::new("lessons"), "serbian");
        assert!(dir.ends_with("lessons/serbian"));
        assert!(language_config_path(&dir).ends_with("serbian/language.toml"));
    }

    #[test]
    fn test_audio_file_name() {
        assert_eq!(audio_file_name("abc123"), "abc123.mp3");
    }
}
