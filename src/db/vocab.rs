//! Per-word mastery rows.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::grading;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabProgress {
  pub word_id: String,
  pub times_correct: u32,
  pub times_incorrect: u32,
  pub mastery_level: u8,
  pub last_reviewed: Option<String>,
}

fn vocab_from_row(row: &Row<'_>) -> Result<VocabProgress> {
  Ok(VocabProgress {
    word_id: row.get(0)?,
    times_correct: row.get(1)?,
    times_incorrect: row.get(2)?,
    mastery_level: row.get(3)?,
    last_reviewed: row.get(4)?,
  })
}

/// Count one graded answer for a word and refresh its mastery level.
///
/// The counter bump is a single upsert; the level is then recomputed
/// from the counts that upsert returned.
pub fn record_vocab_answer(
  conn: &Connection,
  user_id: i64,
  language: &str,
  word_id: &str,
  correct: bool,
) -> Result<VocabProgress> {
  let now = Utc::now().to_rfc3339();
  let (add_correct, add_incorrect) = if correct { (1, 0) } else { (0, 1) };

  let (times_correct, times_incorrect): (u32, u32) = conn.query_row(
    "INSERT INTO vocab_progress
       (user_id, language, word_id, times_correct, times_incorrect, last_reviewed)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT (user_id, language, word_id) DO UPDATE SET
       times_correct = vocab_progress.times_correct + excluded.times_correct,
       times_incorrect = vocab_progress.times_incorrect + excluded.times_incorrect,
       last_reviewed = excluded.last_reviewed
     RETURNING times_correct, times_incorrect",
    params![user_id, language, word_id, add_correct, add_incorrect, now],
    |row| Ok((row.get(0)?, row.get(1)?)),
  )?;

  let mastery_level = grading::mastery_level(times_correct, times_incorrect);
  conn.execute(
    "UPDATE vocab_progress SET mastery_level = ?4
     WHERE user_id = ?1 AND language = ?2 AND word_id = ?3",
    params![user_id, language, word_id, mastery_level],
  )?;

  Ok(VocabProgress {
    word_id: word_id.to_string(),
    times_correct,
    times_incorrect,
    mastery_level,
    last_reviewed: Some(now),
  })
}

pub fn get_vocab_progress(
  conn: &Connection,
  user_id: i64,
  language: &str,
  word_id: &str,
) -> Result<Option<VocabProgress>> {
  conn
    .query_row(
      "SELECT word_id, times_correct, times_incorrect, mastery_level, last_reviewed
       FROM vocab_progress WHERE user_id = ?1 AND language = ?2 AND word_id = ?3",
      params![user_id, language, word_id],
      vocab_from_row,
    )
    .optional()
}

pub fn list_vocab_progress(conn: &Connection, user_id: i64, language: &str) -> Result<Vec<VocabProgress>> {
  let mut stmt = conn.prepare(
    "SELECT word_id, times_correct, times_incorrect, mastery_level, last_reviewed
     FROM vocab_progress WHERE user_id = ?1 AND language = ?2
     ORDER BY word_id",
  )?;
  let rows = stmt.query_map(params![user_id, language], vocab_from_row)?;
  rows.collect()
}

/// Words with at least some mastery (level >= 1)
pub fn count_words_learned(conn: &Connection, user_id: i64, language: &str) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM vocab_progress
     WHERE user_id = ?1 AND language = ?2 AND mastery_level >= 1",
    params![user_id, language],
    |row| row.get(0),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::TestEnv;

  #[test]
  fn test_first_answer_creates_row() {
    let env = TestEnv::new().unwrap();
    let user = env.add_user("alice");

    let wrong = record_vocab_answer(&env.conn, user, "serbian", "hello", false).unwrap();
    assert_eq!((wrong.times_correct, wrong.times_incorrect), (0, 1));
    assert_eq!(wrong.mastery_level, 0);

    let stored = get_vocab_progress(&env.conn, user, "serbian", "hello").unwrap().unwrap();
    assert_eq!(stored.mastery_level, 0);
    assert!(stored.last_reviewed.is_some());
  }

  #[test]
  fn test_mastery_climbs_with_correct_answers() {
    let env = TestEnv::new().unwrap();
    let user = env.add_user("alice");

    let levels: Vec<u8> = (0..5)
      .map(|_| {
        record_vocab_answer(&env.conn, user, "serbian", "thanks", true)
          .unwrap()
          .mastery_level
      })
      .collect();
    // 1/0 → 2, 2/0 → 3, 3/0 → 4, 4/0 → 4, 5/0 → 5
    assert_eq!(levels, [2, 3, 4, 4, 5]);

    let stored = get_vocab_progress(&env.conn, user, "serbian", "thanks").unwrap().unwrap();
    assert_eq!(stored.mastery_level, 5);
    assert_eq!(stored.times_correct, 5);
  }

  #[test]
  fn test_words_learned_counts_level_one_and_up() {
    let env = TestEnv::new().unwrap();
    let user = env.add_user("alice");
    record_vocab_answer(&env.conn, user, "serbian", "a", true).unwrap();
    record_vocab_answer(&env.conn, user, "serbian", "b", false).unwrap();
    record_vocab_answer(&env.conn, user, "croatian", "c", true).unwrap();

    assert_eq!(count_words_learned(&env.conn, user, "serbian").unwrap(), 1);
    let all = list_vocab_progress(&env.conn, user, "serbian").unwrap();
    assert_eq!(all.iter().map(|v| v.word_id.as_str()).collect::<Vec<_>>(), ["a", "b"]);
  }
}
