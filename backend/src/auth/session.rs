//! Session lifecycle: creation, validation, activity tracking and expiry.
//!
//! Sessions live in a process-local registry behind the [`SessionStore`]
//! trait. [`SessionManager`] layers the inactivity timeout on top and reads
//! time through an injectable [`Clock`], so expiry can be exercised without
//! sleeping.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use super::models::{AuthenticatedUser, Session, SessionId, SessionState};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Storage backend for live sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, id: SessionId, session: Session);

    async fn get(&self, id: &SessionId) -> Option<Session>;

    /// Set `last_activity`. Returns `false` if the id is unknown.
    async fn touch(&self, id: &SessionId, at: DateTime<Utc>) -> bool;

    async fn remove(&self, id: &SessionId) -> Option<Session>;

    /// Drop every session idle since before `cutoff`. Returns how many were dropped.
    async fn purge_idle(&self, cutoff: DateTime<Utc>) -> usize;
}

/// In-process session registry.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, id: SessionId, session: Session) {
        self.sessions.write().await.insert(id, session);
    }

    async fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn touch(&self, id: &SessionId, at: DateTime<Utc>) -> bool {
        match self.sessions.write().await.get_mut(id) {
            Some(session) => {
                session.last_activity = at;
                true
            }
            None => false,
        }
    }

    async fn remove(&self, id: &SessionId) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    async fn purge_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_activity >= cutoff);
        before - sessions.len()
    }
}

/// Applies the inactivity timeout to a [`SessionStore`].
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    timeout: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            timeout: TimeDelta::from_std(timeout).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    pub fn timeout(&self) -> TimeDelta {
        self.timeout
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Open a session for `user`. Any `previous` id the client presented is
    /// destroyed first so a pre-login id can never become authenticated.
    pub async fn start(
        &self,
        user: &AuthenticatedUser,
        previous: Option<&SessionId>,
    ) -> (SessionId, Session) {
        if let Some(previous) = previous {
            self.store.remove(previous).await;
        }

        let now = self.clock.now();
        if let Some(cutoff) = now.checked_sub_signed(self.timeout) {
            let purged = self.store.purge_idle(cutoff).await;
            if purged > 0 {
                tracing::debug!(purged, "Dropped idle sessions");
            }
        }

        let id = SessionId::generate();
        let session = Session::new(user, now);
        self.store.insert(id.clone(), session.clone()).await;
        (id, session)
    }

    /// Resolve a presented id. An expired session is destroyed before
    /// [`SessionState::Expired`] is returned.
    pub async fn check(&self, id: Option<&SessionId>) -> SessionState {
        let Some(id) = id else {
            return SessionState::Anonymous;
        };
        let Some(session) = self.store.get(id).await else {
            return SessionState::Anonymous;
        };

        if self.clock.now() - session.last_activity > self.timeout {
            self.store.remove(id).await;
            tracing::info!(user_id = session.user_id, "Session expired");
            return SessionState::Expired;
        }
        SessionState::Authenticated(session)
    }

    /// True iff `id` names a live session within the timeout.
    pub async fn is_valid(&self, id: &SessionId) -> bool {
        matches!(self.check(Some(id)).await, SessionState::Authenticated(_))
    }

    /// Record activity now.
    pub async fn touch(&self, id: &SessionId) -> bool {
        self.store.touch(id, self.clock.now()).await
    }

    /// Invalidate `id`. Returns `false` if it was not live.
    pub async fn destroy(&self, id: &SessionId) -> bool {
        self.store.remove(id).await.is_some()
    }
}
