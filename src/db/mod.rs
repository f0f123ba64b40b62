pub mod lesson_progress;
pub mod quiz_attempts;
pub mod schema;
pub mod users;
pub mod vocab;

use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use lesson_progress::*;
pub use quiz_attempts::*;
pub use schema::run_migrations;
pub use users::*;
pub use vocab::*;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
  /// Log the error at warn level and return None
  fn log_warn(self, context: &str) -> Option<T>;
  /// Log the error at warn level and return the default
  fn log_warn_default(self, context: &str) -> T
  where
    T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
  fn log_warn(self, context: &str) -> Option<T> {
    match self {
      Ok(v) => Some(v),
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        None
      }
    }
  }

  fn log_warn_default(self, context: &str) -> T
  where
    T: Default,
  {
    match self {
      Ok(v) => v,
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        T::default()
      }
    }
  }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Database unavailable")
  }
}

impl std::error::Error for DbLockError {}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

/// Open (creating if needed) the database and bring its schema up to date
pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    if let Err(e) = std::fs::create_dir_all(parent) {
      tracing::warn!("Could not create {}: {}", parent.display(), e);
    }
  }

  let conn = Connection::open(path)?;
  configure(&conn)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory database with the full schema, for tests and tooling
pub fn init_memory_db() -> Result<DbPool> {
  let conn = Connection::open_in_memory()?;
  configure(&conn)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

fn configure(conn: &Connection) -> Result<()> {
  // journal_mode returns a row, so it goes through pragma_update_and_check
  conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
  conn.pragma_update(None, "foreign_keys", "ON")?;
  Ok(())
}
