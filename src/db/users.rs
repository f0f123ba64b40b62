//! User accounts.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub email: String,
  pub display_name: String,
}

/// Fields needed to create an account
pub struct NewUser<'a> {
  pub username: &'a str,
  pub email: &'a str,
  pub display_name: &'a str,
  pub password_hash: &'a str,
}

fn user_from_row(row: &Row<'_>) -> Result<User> {
  Ok(User {
    id: row.get(0)?,
    username: row.get(1)?,
    email: row.get(2)?,
    display_name: row.get(3)?,
  })
}

/// Insert a user, returning the new id.
///
/// Fails with a constraint violation when the username or email is taken.
pub fn create_user(conn: &Connection, user: &NewUser<'_>) -> Result<i64> {
  conn.execute(
    "INSERT INTO users (username, email, display_name, password_hash, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      user.username,
      user.email,
      user.display_name,
      user.password_hash,
      Utc::now().to_rfc3339()
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Returns (user_id, password_hash) for login
pub fn get_credentials(conn: &Connection, username: &str) -> Result<Option<(i64, String)>> {
  conn
    .query_row(
      "SELECT id, password_hash FROM users WHERE username = ?1",
      params![username],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

pub fn get_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<User>> {
  conn
    .query_row(
      "SELECT id, username, email, display_name FROM users WHERE id = ?1",
      params![user_id],
      user_from_row,
    )
    .optional()
}

/// Whether a username or email is already registered (case-insensitive)
pub fn user_exists(conn: &Connection, username: &str, email: &str) -> Result<bool> {
  let count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
    params![username, email],
    |row| row.get(0),
  )?;
  Ok(count > 0)
}

/// Is this a UNIQUE constraint failure (duplicate username/email)?
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}
