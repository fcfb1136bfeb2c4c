use std::time::{Duration, Instant};

use dashmap::DashMap;
use domains::{SessionStore, UserId};

struct Session {
    user_id: UserId,
    created: Instant,
}

/// Session id → user id. A session lives for `ttl` after login.
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self { sessions: DashMap::new(), ttl }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn expired(&self, session: &Session) -> bool {
        session.created.elapsed() >= self.ttl
    }
}

impl SessionStore for MemorySessionStore {
    fn bind(&self, session_id: &str, user_id: UserId) {
        self.sessions
            .insert(session_id.to_string(), Session { user_id, created: Instant::now() });
    }

    fn resolve(&self, session_id: &str) -> Option<UserId> {
        if self.sessions.remove_if(session_id, |_, s| self.expired(s)).is_some() {
            return None;
        }
        self.sessions.get(session_id).map(|s| s.user_id)
    }

    fn revoke(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    fn sweep(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !self.expired(s));
        before.saturating_sub(self.sessions.len())
    }
}
