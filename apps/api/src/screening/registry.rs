//! In-process session table. Sessions are never persisted; only a finished
//! screening reaches the store. Finished sessions are dropped by the finish
//! handler, abandoned ones by `sweep_idle`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::screening::session::Session;

pub type SharedSession = Arc<Mutex<Session>>;

struct Entry {
    session: SharedSession,
    last_access: Instant,
}

/// Maps session ids to sessions. Each session has its own lock, so one
/// candidate's slow oracle call never blocks another candidate.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh session and returns a handle to it.
    pub async fn create(&self) -> SharedSession {
        let session = Session::new();
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(
            id,
            Entry {
                session: shared.clone(),
                last_access: Instant::now(),
            },
        );
        info!("Session {id} started");
        shared
    }

    /// Looks up a session and marks it as recently used.
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_access = Instant::now();
        Some(entry.session.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Session {id} dropped");
        }
        removed
    }

    /// Drops every session not looked up within `max_idle`. Returns how many went.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_access) < max_idle);
        let swept = before - sessions.len();
        if swept > 0 {
            info!("Dropped {swept} idle sessions");
        }
        swept
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Runs `sweep_idle` every `period` for the life of the process.
pub fn spawn_idle_sweeper(
    registry: Arc<SessionRegistry>,
    max_idle: Duration,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            registry.sweep_idle(max_idle).await;
        }
    })
}
