// Session storage backends

use super::error::SessionError;
use super::limiter;
use super::types::{Session, SessionStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Trait for session storage backends.
///
/// Every mutating operation keeps the primary map, the per-user index, and
/// the refresh-token index consistent with one another; callers never see a
/// state where one was updated without the others.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Store a new session, enforcing the per-user cap atomically with the
    /// insert. Returns the sessions evicted to make room.
    async fn insert(
        &self,
        session: Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, SessionError>;

    /// Get a session by ID
    async fn get(&self, session_id: Uuid) -> Option<Session>;

    /// Update a session's last-activity timestamp, returning the updated
    /// record
    async fn touch(&self, session_id: Uuid, now: DateTime<Utc>) -> Option<Session>;

    /// Delete a session from all indices; returns whether it existed
    async fn remove(&self, session_id: Uuid) -> bool;

    /// Delete every session belonging to a user; returns how many went
    async fn remove_user_sessions(&self, user_id: &str) -> usize;

    /// Sessions for a user that are still within their lifetime. Stale
    /// records are skipped, not mutated; reclaiming them is the sweep's job.
    async fn list_by_user(&self, user_id: &str, now: DateTime<Utc>) -> Vec<Session>;

    /// Look up the session bound to a refresh token
    async fn find_by_refresh_token(&self, token: &str) -> Option<Session>;

    /// Remove every session past its expiry; returns how many were removed
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> usize;

    /// Counts for monitoring
    async fn stats(&self, now: DateTime<Utc>) -> SessionStats;
}

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<Uuid, Session>,
    user_index: HashMap<String, HashSet<Uuid>>,
    refresh_index: HashMap<String, Uuid>,
}

impl StoreInner {
    /// The one removal path: strips a session from all three maps. An empty
    /// per-user set is dropped from the index, never left behind.
    fn remove_session(&mut self, session_id: Uuid) -> Option<Session> {
        let session = self.sessions.remove(&session_id)?;

        if let Some(ids) = self.user_index.get_mut(&session.user_id) {
            ids.remove(&session_id);
            if ids.is_empty() {
                self.user_index.remove(&session.user_id);
            }
        }
        self.refresh_index.remove(&session.refresh_token);

        Some(session)
    }
}

/// In-memory session storage implementation
pub struct MemorySessionStorage {
    inner: RwLock<StoreInner>,
    max_sessions_per_user: usize,
}

impl MemorySessionStorage {
    pub fn new(max_sessions_per_user: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            max_sessions_per_user,
        }
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn insert(
        &self,
        session: Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, SessionError> {
        let mut inner = self.inner.write().await;

        if inner.sessions.contains_key(&session.session_id) {
            return Err(SessionError::DuplicateSessionId(session.session_id));
        }

        // The cap check and the insert happen under the same write guard, so
        // two concurrent creations for one user cannot both pass the check.
        let evict_ids: Vec<Uuid> = match inner.user_index.get(&session.user_id) {
            Some(ids) => {
                let records: Vec<&Session> =
                    ids.iter().filter_map(|id| inner.sessions.get(id)).collect();
                limiter::plan_evictions(&records, self.max_sessions_per_user, now)
            }
            None => Vec::new(),
        };

        let mut evicted = Vec::with_capacity(evict_ids.len());
        for id in evict_ids {
            if let Some(old) = inner.remove_session(id) {
                evicted.push(old);
            }
        }

        info!(
            "Creating session {} for user {}",
            session.session_id, session.user_id
        );

        inner
            .user_index
            .entry(session.user_id.clone())
            .or_default()
            .insert(session.session_id);
        inner
            .refresh_index
            .insert(session.refresh_token.clone(), session.session_id);
        inner.sessions.insert(session.session_id, session);

        Ok(evicted)
    }

    async fn get(&self, session_id: Uuid) -> Option<Session> {
        let inner = self.inner.read().await;
        inner.sessions.get(&session_id).cloned()
    }

    async fn touch(&self, session_id: Uuid, now: DateTime<Utc>) -> Option<Session> {
        let mut inner = self.inner.write().await;
        let session = inner.sessions.get_mut(&session_id)?;
        session.last_activity = now;
        Some(session.clone())
    }

    async fn remove(&self, session_id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.remove_session(session_id).is_some();
        if removed {
            info!("Removed session {}", session_id);
        }
        removed
    }

    async fn remove_user_sessions(&self, user_id: &str) -> usize {
        let mut inner = self.inner.write().await;

        let ids: Vec<Uuid> = match inner.user_index.get(user_id) {
            Some(ids) => ids.iter().copied().collect(),
            None => return 0,
        };

        let mut count = 0;
        for id in ids {
            if inner.remove_session(id).is_some() {
                count += 1;
            }
        }

        info!("Removed {} sessions for user {}", count, user_id);
        count
    }

    async fn list_by_user(&self, user_id: &str, now: DateTime<Utc>) -> Vec<Session> {
        let inner = self.inner.read().await;

        match inner.user_index.get(user_id) {
            Some(ids) => ids
                .iter()
                .filter_map(|id| inner.sessions.get(id))
                .filter(|s| s.is_live(now))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    async fn find_by_refresh_token(&self, token: &str) -> Option<Session> {
        let inner = self.inner.read().await;
        let session_id = inner.refresh_index.get(token)?;
        inner.sessions.get(session_id).cloned()
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
        // Collect first, destroy afterward; removal is idempotent, so ids
        // destroyed by someone else in between are simply skipped.
        let expired: Vec<Uuid> = {
            let inner = self.inner.read().await;
            inner
                .sessions
                .iter()
                .filter(|(_, s)| !s.is_live(now))
                .map(|(id, _)| *id)
                .collect()
        };

        if expired.is_empty() {
            return 0;
        }

        let mut inner = self.inner.write().await;
        let mut count = 0;
        for id in expired {
            if inner.remove_session(id).is_some() {
                count += 1;
            }
        }

        if count > 0 {
            debug!("Cleaned up {} expired sessions", count);
        }
        count
    }

    async fn stats(&self, now: DateTime<Utc>) -> SessionStats {
        let inner = self.inner.read().await;
        SessionStats {
            total_sessions: inner.sessions.len(),
            active_users: inner.user_index.len(),
            expired_sessions: inner
                .sessions
                .values()
                .filter(|s| !s.is_live(now))
                .count(),
        }
    }
}
