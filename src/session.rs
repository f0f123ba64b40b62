//! In-memory session registry.
//!
//! Maps opaque cookie tokens to the signed-in user and their script
//! preference. Constructed once at startup and shared through
//! [`crate::state::AppState`]; a process restart drops every session.
//!
//! Reads (`get`, `authenticate`) take a shared lock and never mutate, so
//! an expired entry stays in the map until it is deleted or swept by a
//! later `create`.

use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

use crate::config;

/// Random bytes per token (hex encoded to 64 characters)
const TOKEN_BYTES: usize = 32;

/// How lesson text is shown for languages with two scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptPreference {
  Latin,
  Cyrillic,
  #[default]
  Both,
}

impl ScriptPreference {
  pub fn as_str(&self) -> &'static str {
    match self {
      ScriptPreference::Latin => "latin",
      ScriptPreference::Cyrillic => "cyrillic",
      ScriptPreference::Both => "both",
    }
  }

  /// Parse a client-supplied mode, falling back to `Both` for anything unknown
  pub fn parse_or_default(mode: &str) -> Self {
    mode.parse().unwrap_or_default()
  }
}

impl FromStr for ScriptPreference {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "latin" => Ok(ScriptPreference::Latin),
      "cyrillic" => Ok(ScriptPreference::Cyrillic),
      "both" => Ok(ScriptPreference::Both),
      _ => Err(()),
    }
  }
}

impl fmt::Display for ScriptPreference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A live session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub user_id: i64,
  pub expires_at: DateTime<Utc>,
  pub script: ScriptPreference,
}

impl Session {
  fn is_live_at(&self, now: DateTime<Utc>) -> bool {
    now < self.expires_at
  }
}

/// Who a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
  Anonymous,
  User {
    user_id: i64,
    script: ScriptPreference,
  },
}

impl Identity {
  pub fn user_id(&self) -> Option<i64> {
    match self {
      Identity::Anonymous => None,
      Identity::User { user_id, .. } => Some(*user_id),
    }
  }
}

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("failed to generate session token: {0}")]
  Entropy(String),
}

/// Token → session map guarded by a read/write lock
pub struct SessionRegistry {
  sessions: RwLock<HashMap<String, Session>>,
  ttl: Duration,
}

impl Default for SessionRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl SessionRegistry {
  /// Registry with the standard session lifetime
  pub fn new() -> Self {
    Self::with_ttl(Duration::hours(config::SESSION_DURATION_HOURS))
  }

  pub fn with_ttl(ttl: Duration) -> Self {
    Self {
      sessions: RwLock::new(HashMap::new()),
      ttl,
    }
  }

  /// Issue a fresh token for `user_id`
  pub fn create(&self, user_id: i64) -> Result<String, SessionError> {
    self.create_at(user_id, Utc::now())
  }

  fn create_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, SessionError> {
    // Entropy is drawn before the lock is taken
    let token = generate_token()?;
    let session = Session {
      user_id,
      expires_at: now + self.ttl,
      script: ScriptPreference::default(),
    };
    let sweep = rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD;

    let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
    if sweep {
      sessions.retain(|_, s| s.is_live_at(now));
    }
    sessions.insert(token.clone(), session);
    drop(sessions);

    tracing::debug!("Created session for user {}", user_id);
    Ok(token)
  }

  /// Look up a live session; expired entries read as absent
  pub fn get(&self, token: &str) -> Option<Session> {
    self.get_at(token, Utc::now())
  }

  fn get_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
    let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
    sessions.get(token).filter(|s| s.is_live_at(now)).cloned()
  }

  /// Remove a session; unknown tokens are ignored
  pub fn delete(&self, token: &str) {
    let removed = self
      .sessions
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(token);
    if let Some(session) = removed {
      tracing::debug!("Revoked session for user {}", session.user_id);
    }
  }

  /// Change the script preference of an existing session
  pub fn set_preference(&self, token: &str, script: ScriptPreference) {
    let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(session) = sessions.get_mut(token) {
      session.script = script;
    }
  }

  /// Resolve a request's token (if any) to an identity
  pub fn authenticate(&self, token: Option<&str>) -> Identity {
    match token.and_then(|t| self.get(t)) {
      Some(session) => Identity::User {
        user_id: session.user_id,
        script: session.script,
      },
      None => Identity::Anonymous,
    }
  }

  /// Number of stored entries, including expired ones not yet swept
  pub fn len(&self) -> usize {
    self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Generate a 256-bit token from the OS RNG
fn generate_token() -> Result<String, SessionError> {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng
    .try_fill_bytes(&mut bytes)
    .map_err(|e| SessionError::Entropy(e.to_string()))?;
  Ok(hex::encode(bytes))
}
