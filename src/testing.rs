//! Test utilities for database and catalog setup.
//!
//! Provides helpers that reuse the authoritative schema migrations,
//! eliminating schema duplication in test code.

use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

use crate::db;
use crate::lessons::{Catalog, Language, LanguageCatalog, Lesson};

/// Test environment with a migrated speakeasy.db in a temporary directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    /// Connection with the full schema (all migrations)
    pub conn: Connection,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(temp.path().join("speakeasy.db"))?;
        db::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Insert a user with throwaway credentials, returning its id
    pub fn add_user(&self, username: &str) -> i64 {
        let email = format!("{username}@example.com");
        db::create_user(
            &self.conn,
            &db::NewUser {
                username,
                email: &email,
                display_name: username,
                password_hash: "not-a-real-hash",
            },
        )
        .expect("failed to insert test user")
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}

/// Build a lesson from a JSON quiz body
pub fn lesson(id: &str, order: u32, questions_json: &str) -> Lesson {
    serde_json::from_str(&format!(
        r#"{{
          "id": "{id}",
          "title": "Lesson {order}",
          "order": {order},
          "sections": [{{"type": "vocabulary", "title": "Words", "items": [
            {{"id": "zdravo", "english": "hello", "target_primary": "zdravo", "target_alt": "здраво"}}
          ]}}],
          "quiz": {{"questions": {questions_json}}}
        }}"#
    ))
    .expect("invalid test lesson JSON")
}

/// Four questions, one of each kind; answers "1", "1", "hvala" and a
/// full reconstruction of the pairs are all correct.
pub const STANDARD_QUIZ: &str = r#"[
  {"type": "multiple_choice", "question": "Hello?", "options": ["hvala", "zdravo"], "correct": 1, "word_id": "zdravo"},
  {"type": "listen_and_choose", "options": ["da", "zdravo"], "correct": 1, "word_id": "zdravo"},
  {"type": "type_answer", "prompt": "Thank you", "correct_answers": ["hvala"]},
  {"type": "match_pairs", "pairs": [{"english": "yes", "target": "da"}, {"english": "no", "target": "ne"}]}
]"#;

/// Correct match answer for the pairs in [`STANDARD_QUIZ`] (shuffled: ["ne", "da"])
pub const STANDARD_MATCH_ANSWER: &str = r#"[{"english":0,"target":1},{"english":1,"target":0}]"#;

/// Serbian catalog with `count` lessons (`lesson1`..), each using [`STANDARD_QUIZ`]
pub fn serbian_catalog(count: u32) -> Catalog {
    let language = Language {
        slug: "serbian".to_string(),
        display_name: "Serbian".to_string(),
        tts_code: "sr".to_string(),
        has_dual_script: true,
        script_label: "Latin".to_string(),
        alt_script_label: Some("Cyrillic".to_string()),
    };
    let lessons = (1..=count)
        .map(|order| lesson(&format!("lesson{order}"), order, STANDARD_QUIZ))
        .collect();
    let serbian = LanguageCatalog::new(language, lessons).expect("invalid test catalog");
    Catalog::from_languages([serbian])
}
