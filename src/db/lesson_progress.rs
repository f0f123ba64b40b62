//! Per-lesson progress rows.
//!
//! Every write is a single upsert keyed on (user_id, language, lesson_id)
//! so two concurrent submissions for the same lesson cannot lose an
//! attempt or regress a status.

use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;
use std::fmt;

/// Where a user stands with one lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
  Locked,
  Available,
  InProgress,
  Completed,
}

impl LessonStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      LessonStatus::Locked => "locked",
      LessonStatus::Available => "available",
      LessonStatus::InProgress => "in_progress",
      LessonStatus::Completed => "completed",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "locked" => Some(LessonStatus::Locked),
      "available" => Some(LessonStatus::Available),
      "in_progress" => Some(LessonStatus::InProgress),
      "completed" => Some(LessonStatus::Completed),
      _ => None,
    }
  }

  /// Status of a lesson with no stored row
  pub fn initial(order: u32) -> Self {
    if order == 1 {
      LessonStatus::Available
    } else {
      LessonStatus::Locked
    }
  }
}

impl fmt::Display for LessonStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl ToSql for LessonStatus {
  fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
    Ok(ToSqlOutput::from(self.as_str()))
  }
}

impl FromSql for LessonStatus {
  fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
    let s = value.as_str()?;
    LessonStatus::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown lesson status {s:?}").into()))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonProgress {
  pub lesson_id: String,
  pub status: LessonStatus,
  pub best_score: u8,
  pub attempts: u32,
  pub last_accessed: Option<String>,
  pub completed_at: Option<String>,
}

const PROGRESS_COLUMNS: &str = "lesson_id, status, best_score, attempts, last_accessed, completed_at";

fn progress_from_row(row: &Row<'_>) -> Result<LessonProgress> {
  Ok(LessonProgress {
    lesson_id: row.get(0)?,
    status: row.get(1)?,
    best_score: row.get(2)?,
    attempts: row.get(3)?,
    last_accessed: row.get(4)?,
    completed_at: row.get(5)?,
  })
}

/// Insert a row with `status` unless one already exists
pub fn seed_lesson_progress(
  conn: &Connection,
  user_id: i64,
  language: &str,
  lesson_id: &str,
  status: LessonStatus,
) -> Result<()> {
  conn.execute(
    "INSERT INTO lesson_progress (user_id, language, lesson_id, status)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (user_id, language, lesson_id) DO NOTHING",
    params![user_id, language, lesson_id, status],
  )?;
  Ok(())
}

pub fn get_lesson_progress(
  conn: &Connection,
  user_id: i64,
  language: &str,
  lesson_id: &str,
) -> Result<Option<LessonProgress>> {
  conn
    .query_row(
      &format!(
        "SELECT {PROGRESS_COLUMNS} FROM lesson_progress
         WHERE user_id = ?1 AND language = ?2 AND lesson_id = ?3"
      ),
      params![user_id, language, lesson_id],
      progress_from_row,
    )
    .optional()
}

pub fn list_lesson_progress(
  conn: &Connection,
  user_id: i64,
  language: &str,
) -> Result<Vec<LessonProgress>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {PROGRESS_COLUMNS} FROM lesson_progress WHERE user_id = ?1 AND language = ?2"
  ))?;
  let rows = stmt.query_map(params![user_id, language], progress_from_row)?;
  rows.collect()
}

/// Record a lesson view.
///
/// Available and in-progress lessons become in-progress; locked and
/// completed rows keep their status. Returns the resulting status.
pub fn mark_lesson_viewed(
  conn: &Connection,
  user_id: i64,
  language: &str,
  lesson_id: &str,
) -> Result<LessonStatus> {
  conn.query_row(
    "INSERT INTO lesson_progress (user_id, language, lesson_id, status, last_accessed)
     VALUES (?1, ?2, ?3, 'in_progress', ?4)
     ON CONFLICT (user_id, language, lesson_id) DO UPDATE SET
       status = CASE
         WHEN lesson_progress.status IN ('available', 'in_progress') THEN 'in_progress'
         ELSE lesson_progress.status
       END,
       last_accessed = excluded.last_accessed
     RETURNING status",
    params![user_id, language, lesson_id, Utc::now().to_rfc3339()],
    |row| row.get(0),
  )
}

/// Apply one quiz submission.
///
/// Attempts increment, best score keeps the maximum, a pass completes
/// the lesson (first completion time is kept) and a fail leaves an
/// unfinished lesson in progress. A completed lesson stays completed.
pub fn record_quiz_result(
  conn: &Connection,
  user_id: i64,
  language: &str,
  lesson_id: &str,
  score: u8,
  passed: bool,
) -> Result<LessonProgress> {
  let now = Utc::now().to_rfc3339();
  let (status, completed_at) = if passed {
    (LessonStatus::Completed, Some(now.as_str()))
  } else {
    (LessonStatus::InProgress, None)
  };

  conn.query_row(
    &format!(
      "INSERT INTO lesson_progress
         (user_id, language, lesson_id, status, best_score, attempts, last_accessed, completed_at)
       VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)
       ON CONFLICT (user_id, language, lesson_id) DO UPDATE SET
         status = CASE
           WHEN lesson_progress.status = 'completed' THEN 'completed'
           ELSE excluded.status
         END,
         best_score = MAX(lesson_progress.best_score, excluded.best_score),
         attempts = lesson_progress.attempts + 1,
         last_accessed = excluded.last_accessed,
         completed_at = COALESCE(lesson_progress.completed_at, excluded.completed_at)
       RETURNING {PROGRESS_COLUMNS}"
    ),
    params![user_id, language, lesson_id, status, score, now, completed_at],
    progress_from_row,
  )
}

/// Promote a lesson to available only if it is locked (or has no row).
///
/// Returns whether anything changed.
pub fn unlock_lesson(conn: &Connection, user_id: i64, language: &str, lesson_id: &str) -> Result<bool> {
  let changed = conn.execute(
    "INSERT INTO lesson_progress (user_id, language, lesson_id, status)
     VALUES (?1, ?2, ?3, 'available')
     ON CONFLICT (user_id, language, lesson_id) DO UPDATE SET
       status = 'available'
     WHERE lesson_progress.status = 'locked'",
    params![user_id, language, lesson_id],
  )?;
  Ok(changed > 0)
}

pub fn count_completed_lessons(conn: &Connection, user_id: i64, language: &str) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM lesson_progress
     WHERE user_id = ?1 AND language = ?2 AND status = 'completed'",
    params![user_id, language],
    |row| row.get(0),
  )
}

/// Sum of best scores over completed lessons, with the lesson count
pub fn completed_score_totals(conn: &Connection, user_id: i64, language: &str) -> Result<(i64, i64)> {
  conn.query_row(
    "SELECT COALESCE(SUM(best_score), 0), COUNT(*) FROM lesson_progress
     WHERE user_id = ?1 AND language = ?2 AND status = 'completed'",
    params![user_id, language],
    |row| Ok((row.get(0)?, row.get(1)?)),
  )
}
