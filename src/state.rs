//! Application state shared by all handlers.

use std::sync::Arc;

use crate::audio::AudioCache;
use crate::config::Config;
use crate::db::DbPool;
use crate::lessons::Catalog;
use crate::session::SessionRegistry;

/// Everything a request can reach, built once in `main` and cloned per request
#[derive(Clone)]
pub struct AppState {
    /// Users, progress, mastery and quiz attempts
    pub db: DbPool,
    /// Live login sessions (in memory, lost on restart)
    pub sessions: Arc<SessionRegistry>,
    pub audio: Arc<AudioCache>,
    /// Immutable lesson catalog loaded at startup
    pub catalog: Arc<Catalog>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, catalog: Catalog, audio: AudioCache) -> Self {
        Self {
            db,
            sessions: Arc::new(SessionRegistry::new()),
            audio: Arc::new(audio),
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }
}
