//! Application state: the shared catalog, the game config, and the in-memory
//! store of HTTP sessions.
//!
//! WebSocket connections do not use the store; each connection owns its own
//! `GameSession` for as long as the socket is open.
//!
//! The store is bounded: creating a session drops idle entries first and then
//! evicts the least-recently-touched one while the store is full.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::GameConfig;
use crate::session::GameSession;

/// A stored session plus the last time a create or mutation touched it.
pub struct StoredSession {
    pub session: GameSession,
    pub touched: Instant,
}

impl StoredSession {
    fn new(session: GameSession, now: Instant) -> Self {
        Self { session, touched: now }
    }
}

pub type SessionStore = HashMap<String, StoredSession>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub config: GameConfig,
    pub sessions: Arc<RwLock<SessionStore>>,
}

impl AppState {
    /// Build state from a config and the standard catalog.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: GameConfig) -> Self {
        let catalog = Arc::new(Catalog::standard());
        info!(
            target: "password_game",
            levels = catalog.len(),
            hint_threshold = config.hint_threshold,
            max_sessions = config.max_sessions,
            session_idle_secs = config.session_idle_secs,
            debug = config.debug,
            "Level catalog ready"
        );
        Self {
            catalog,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// A fresh playthrough that is not tracked by the store.
    pub fn fresh_session(&self) -> GameSession {
        GameSession::new(self.catalog.clone(), self.config.hint_threshold)
    }

    /// Create and store a new session; returns its id.
    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let session = self.fresh_session();
        let now = Instant::now();
        let cap = self.config.max_sessions.max(1);
        let (live, expired, evicted) = {
            let mut sessions = self.sessions.write().await;
            let expired = match self.config.session_idle() {
                Some(idle) => prune_idle(&mut sessions, now, idle),
                None => 0,
            };
            let evicted = evict_to_fit(&mut sessions, cap);
            sessions.insert(id.clone(), StoredSession::new(session, now));
            (sessions.len(), expired, evicted)
        };
        if expired + evicted > 0 {
            info!(target: "password_game", expired, evicted, "Sessions dropped to make room");
        }
        info!(target: "password_game", session_id = %id, live, "Session created");
        id
    }

    /// Run `f` against the stored session `id` and mark it touched. `None` if the id is unknown.
    pub async fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut GameSession) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(id)?;
        stored.touched = Instant::now();
        Some(f(&mut stored.session))
    }

    /// Read-only access under the read lock; does not refresh the touch time.
    pub async fn read_session<R>(&self, id: &str, f: impl FnOnce(&GameSession) -> R) -> Option<R> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|stored| f(&stored.session))
    }

    /// Drop a stored session. Returns false if it did not exist.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn remove_session(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        debug!(target: "password_game", session_id = %id, removed, "Session removal requested");
        removed
    }
}

/// Drop sessions untouched for longer than `idle` as of `now`. Returns how many went.
fn prune_idle(sessions: &mut SessionStore, now: Instant, idle: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, stored| now.saturating_duration_since(stored.touched) <= idle);
    before - sessions.len()
}

/// Evict least-recently-touched sessions until one more fits under `cap`.
fn evict_to_fit(sessions: &mut SessionStore, cap: usize) -> usize {
    let mut evicted = 0;
    while sessions.len() >= cap {
        let oldest = sessions
            .iter()
            .min_by_key(|(_, stored)| stored.touched)
            .map(|(id, _)| id.clone());
        let Some(oldest) = oldest else { break };
        sessions.remove(&oldest);
        debug!(target: "password_game", session_id = %oldest, "Session evicted (store full)");
        evicted += 1;
    }
    evicted
}
