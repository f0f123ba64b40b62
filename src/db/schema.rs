//! Database schema with version-gated migrations.
//!
//! Each migration checks the recorded version, runs inside a
//! transaction, and records its own version, so running them again is a
//! no-op.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};

/// Current schema version
/// Increment this when adding a new migration
pub const SCHEMA_VERSION: i32 = 2;

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Bootstrap: db_version must exist before the version can be read
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS db_version (
      version INTEGER PRIMARY KEY,
      applied_at TEXT NOT NULL,
      description TEXT
    );
    "#,
  )?;

  let current_version = get_schema_version(conn)?;
  tracing::debug!("speakeasy.db schema version: {}", current_version);

  if current_version < 1 {
    migrate_v0_to_v1(conn)?;
  }
  if current_version < 2 {
    migrate_v1_to_v2(conn)?;
  }

  Ok(())
}

/// v0→v1: users and per-lesson progress
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v0→v1: Create users and lesson progress");

  let tx = conn.unchecked_transaction()?;
  tx.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      username TEXT NOT NULL UNIQUE COLLATE NOCASE,
      email TEXT NOT NULL UNIQUE COLLATE NOCASE,
      display_name TEXT NOT NULL,
      password_hash TEXT NOT NULL,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS lesson_progress (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      language TEXT NOT NULL,
      lesson_id TEXT NOT NULL,
      status TEXT NOT NULL DEFAULT 'locked'
        CHECK (status IN ('locked', 'available', 'in_progress', 'completed')),
      best_score INTEGER NOT NULL DEFAULT 0,
      attempts INTEGER NOT NULL DEFAULT 0,
      last_accessed TEXT,
      completed_at TEXT,
      UNIQUE (user_id, language, lesson_id),
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS quiz_attempts (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      language TEXT NOT NULL,
      lesson_id TEXT NOT NULL,
      score INTEGER NOT NULL,
      total_questions INTEGER NOT NULL,
      correct_answers INTEGER NOT NULL,
      attempted_at TEXT NOT NULL,
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_lesson_progress_user_lang
      ON lesson_progress(user_id, language);
    CREATE INDEX IF NOT EXISTS idx_quiz_attempts_user_lesson
      ON quiz_attempts(user_id, language, lesson_id);
    "#,
  )?;
  record_version(&tx, 1, "Create users, lesson_progress, quiz_attempts")?;
  tx.commit()
}

/// v1→v2: per-word mastery
fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v1→v2: Add vocab_progress");

  let tx = conn.unchecked_transaction()?;
  tx.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS vocab_progress (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      language TEXT NOT NULL,
      word_id TEXT NOT NULL,
      times_correct INTEGER NOT NULL DEFAULT 0,
      times_incorrect INTEGER NOT NULL DEFAULT 0,
      mastery_level INTEGER NOT NULL DEFAULT 0
        CHECK (mastery_level BETWEEN 0 AND 5),
      last_reviewed TEXT,
      UNIQUE (user_id, language, word_id),
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_vocab_progress_user_lang
      ON vocab_progress(user_id, language);
    "#,
  )?;
  record_version(&tx, 2, "Add vocab_progress")?;
  tx.commit()
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<()> {
  conn.execute(
    "INSERT OR REPLACE INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
    params![version, Utc::now().to_rfc3339(), description],
  )?;
  Ok(())
}

/// Highest applied migration, 0 for a fresh database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
  let version: Option<i32> = conn
    .query_row("SELECT MAX(version) FROM db_version", [], |row| row.get(0))
    .optional()?
    .flatten();
  Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table_exists(conn: &Connection, table: &str) -> bool {
    conn
      .query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |_| Ok(()),
      )
      .is_ok()
  }

  #[test]
  fn test_fresh_database_gets_all_tables() {
    let conn = Connection::open_in_memory().unwrap();
    assert_eq!(get_schema_version(&conn).unwrap_or(0), 0);

    run_migrations(&conn).unwrap();
    for table in ["users", "lesson_progress", "quiz_attempts", "vocab_progress"] {
      assert!(table_exists(&conn, table), "missing table {}", table);
    }
    assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
  }

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();

    let rows: i64 = conn
      .query_row("SELECT COUNT(*) FROM db_version", [], |row| row.get(0))
      .unwrap();
    assert_eq!(rows, SCHEMA_VERSION as i64);
  }

  #[test]
  fn test_status_check_constraint() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
      .execute(
        "INSERT INTO users (username, email, display_name, password_hash, created_at)
         VALUES ('a', 'a@x', 'A', 'h', 'now')",
        [],
      )
      .unwrap();
    let result = conn.execute(
      "INSERT INTO lesson_progress (user_id, language, lesson_id, status) VALUES (1, 'serbian', 'l1', 'bogus')",
      [],
    );
    assert!(result.is_err());
  }
}
