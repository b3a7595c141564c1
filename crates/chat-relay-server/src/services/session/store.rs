use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::models::chat::{Role, Session, SessionId, Turn};

/// Scripted exchange every new session starts with
#[derive(Debug, Clone)]
pub struct WelcomeExchange {
    pub greeting: String,
    pub welcome: String,
}

impl WelcomeExchange {
    pub fn new(greeting: impl Into<String>, welcome: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
            welcome: welcome.into(),
        }
    }

    fn seed_turns(&self) -> Vec<Turn> {
        vec![
            Turn::scripted(Role::User, self.greeting.clone()),
            Turn::scripted(Role::Model, self.welcome.clone()),
        ]
    }
}

struct SessionEntry {
    session: Session,
    /// Held by a submission from user-turn append until reply append
    writer: Arc<Mutex<()>>,
}

/// In-memory session storage keyed by session id.
///
/// Entries live until the process exits. Shard locks are never held
/// across an `.await`; ordering between concurrent submissions to one
/// session comes from the per-session writer lock.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<DashMap<SessionId, SessionEntry>>,
    welcome: Arc<WelcomeExchange>,
}

impl SessionStore {
    pub fn new(welcome: WelcomeExchange) -> Self {
        info!("Initializing session store with DashMap");
        Self {
            storage: Arc::new(DashMap::new()),
            welcome: Arc::new(welcome),
        }
    }

    /// Return the session for `id`, creating it with the welcome exchange
    /// if absent. Existing sessions get their `last_active` refreshed.
    pub fn get_or_create(&self, id: &str) -> Session {
        let mut entry = self.storage.entry(id.to_string()).or_insert_with(|| {
            debug!("Creating session {}", id);
            SessionEntry {
                session: Session::new(id.to_string(), self.welcome.seed_turns()),
                writer: Arc::new(Mutex::new(())),
            }
        });
        entry.session.touch();
        entry.session.clone()
    }

    /// Snapshot of the session, `None` if unknown
    pub fn get(&self, id: &str) -> Option<Session> {
        self.storage.get(id).map(|entry| entry.session.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.storage.contains_key(id)
    }

    /// Apply `f` to the stored session. Returns `None` if unknown.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut entry = self.storage.get_mut(id)?;
        Some(f(&mut entry.session))
    }

    /// Acquire the single-writer lock of a session. Returns `None` if unknown.
    pub async fn writer(&self, id: &str) -> Option<OwnedMutexGuard<()>> {
        // Clone the Arc out so no shard lock is held while waiting
        let writer = self.storage.get(id).map(|entry| entry.writer.clone())?;
        Some(writer.lock_owned().await)
    }

    pub fn welcome(&self) -> &WelcomeExchange {
        &self.welcome
    }

    /// Get number of active sessions
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}
