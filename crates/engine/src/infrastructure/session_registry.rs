//! Per-session registry for a server-hosted engine.
//!
//! Each session sits behind its own async mutex. There is no global lock:
//! operations on different sessions run concurrently, operations on the same
//! session run one at a time.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use courier_domain::SessionId;

use crate::use_cases::queue::QueueSession;

pub type SharedSession = Arc<Mutex<QueueSession>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SharedSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `session` under its own id, replacing any previous holder.
    pub fn insert(&self, session: QueueSession) -> SessionId {
        let id = session.id();
        if self
            .sessions
            .insert(id, Arc::new(Mutex::new(session)))
            .is_some()
        {
            tracing::warn!(session_id = %id, "Replaced existing queue session");
        } else {
            tracing::info!(session_id = %id, "Queue session registered");
        }
        id
    }

    pub fn get(&self, id: SessionId) -> Option<SharedSession> {
        // Clone the Arc so the map shard is released before anyone awaits.
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: SessionId) -> Option<SharedSession> {
        let removed = self.sessions.remove(&id).map(|(_, session)| session);
        if removed.is_some() {
            tracing::info!(session_id = %id, "Queue session removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Runs `f` with exclusive access to one session.
    ///
    /// Returns `None` if the session is not registered.
    pub async fn with_session<R, F>(&self, id: SessionId, f: F) -> Option<R>
    where
        F: FnOnce(&mut QueueSession) -> R,
    {
        let session = self.get(id)?;
        let mut guard = session.lock().await;
        Some(f(&mut guard))
    }
}
