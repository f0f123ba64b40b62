//! Append-only log of quiz submissions.

use chrono::Utc;
use rusqlite::{params, Connection, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
  pub lesson_id: String,
  pub score: u8,
  pub total_questions: u32,
  pub correct_answers: u32,
  pub attempted_at: String,
}

pub fn insert_quiz_attempt(
  conn: &Connection,
  user_id: i64,
  language: &str,
  lesson_id: &str,
  score: u8,
  total_questions: u32,
  correct_answers: u32,
) -> Result<i64> {
  conn.execute(
    "INSERT INTO quiz_attempts
       (user_id, language, lesson_id, score, total_questions, correct_answers, attempted_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      user_id,
      language,
      lesson_id,
      score,
      total_questions,
      correct_answers,
      Utc::now().to_rfc3339()
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Attempts for one lesson, newest first
pub fn list_quiz_attempts(
  conn: &Connection,
  user_id: i64,
  language: &str,
  lesson_id: &str,
) -> Result<Vec<QuizAttempt>> {
  let mut stmt = conn.prepare(
    "SELECT lesson_id, score, total_questions, correct_answers, attempted_at
     FROM quiz_attempts
     WHERE user_id = ?1 AND language = ?2 AND lesson_id = ?3
     ORDER BY id DESC",
  )?;
  let rows = stmt.query_map(params![user_id, language, lesson_id], |row| {
    Ok(QuizAttempt {
      lesson_id: row.get(0)?,
      score: row.get(1)?,
      total_questions: row.get(2)?,
      correct_answers: row.get(3)?,
      attempted_at: row.get(4)?,
    })
  })?;
  rows.collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::TestEnv;

  #[test]
  fn test_attempts_are_appended() {
    let env = TestEnv::new().unwrap();
    let user = env.add_user("alice");

    insert_quiz_attempt(&env.conn, user, "serbian", "l1", 50, 4, 2).unwrap();
    insert_quiz_attempt(&env.conn, user, "serbian", "l1", 100, 4, 4).unwrap();
    insert_quiz_attempt(&env.conn, user, "serbian", "l2", 75, 4, 3).unwrap();

    let attempts = list_quiz_attempts(&env.conn, user, "serbian", "l1").unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].score, 100);
    assert_eq!(attempts[1].correct_answers, 2);
  }
}
