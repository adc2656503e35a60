//! Registry of live sessions, used for broadcasting.

use crate::session::Session;
use crate::types::SessionId;
use std::collections::HashMap;
use std::sync::RwLock;

/// Live sessions keyed by id.
#[derive(Default)]
pub struct ClientRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) {
        match self.sessions.write() {
            Ok(mut sessions) => {
                sessions.insert(session.id(), session);
            }
            Err(_) => tracing::warn!(session = %session.id(), "registry lock poisoned, session not registered"),
        }
    }

    pub fn remove(&self, id: SessionId) -> Option<Session> {
        self.sessions.write().ok()?.remove(&id)
    }

    pub fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions.read().ok()?.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self, except: Option<SessionId>) -> Vec<Session> {
        match self.sessions.read() {
            Ok(sessions) => sessions
                .values()
                .filter(|s| Some(s.id()) != except)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Send `text` to every session. Returns how many deliveries succeeded.
    pub async fn broadcast(&self, text: &str) -> usize {
        self.send_all(self.snapshot(None), text).await
    }

    /// Send `text` to every session except `except`.
    pub async fn broadcast_except(&self, except: SessionId, text: &str) -> usize {
        self.send_all(self.snapshot(Some(except)), text).await
    }

    async fn send_all(&self, targets: Vec<Session>, text: &str) -> usize {
        let mut sent = 0;
        for session in targets {
            if session.send(text).await.is_sent() {
                sent += 1;
            }
        }
        sent
    }
}
