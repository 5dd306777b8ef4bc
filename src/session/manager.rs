// Session manager for high-level session operations

use super::cleanup::spawn_cleanup_task;
use super::clock::Clock;
use super::error::SessionError;
use super::storage::SessionStorage;
use super::types::{Session, SessionConfig, SessionInfo, SessionStats, TokenPair};
use crate::auth::TokenCodec;
use crate::models::UserRole;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The facade every collaborator talks to: issues, validates, refreshes,
/// enumerates, and revokes sessions.
///
/// Authentication failures of any kind come back as `None`/`false`; callers
/// cannot tell a garbled token from a revoked session. Built against
/// injected storage, clock, and secret so tests run against a frozen clock.
pub struct SessionManager {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    codec: TokenCodec,
    config: SessionConfig,
    cleanup_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
        secret: &[u8],
        config: SessionConfig,
    ) -> Self {
        let codec = TokenCodec::new(secret, config.access_token_ttl_secs);
        Self {
            storage,
            clock,
            codec,
            config,
            cleanup_task: Mutex::new(None),
        }
    }

    /// Start the background expiry sweep. Nothing ticks until this is
    /// called, so construction alone has no side effects.
    pub fn start(&self) {
        let handle = spawn_cleanup_task(
            Arc::clone(&self.storage),
            Arc::clone(&self.clock),
            self.config.cleanup_interval_secs,
        );

        let mut slot = self
            .cleanup_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            warn!("Session cleanup task was already running; replacing it");
            previous.abort();
        }
        info!(
            "Session cleanup running every {}s",
            self.config.cleanup_interval_secs
        );
    }

    /// Stop the background sweep so the process can exit cleanly.
    pub fn shutdown(&self) {
        let mut slot = self
            .cleanup_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
            info!("Session cleanup stopped");
        }
    }

    /// Open a session for an authenticated principal and mint its first
    /// token pair. Called once per successful login or registration.
    ///
    /// The storage insert enforces the per-user cap, so this can push out
    /// the user's least-recently-active session.
    pub async fn create_session(
        &self,
        user_id: &str,
        email: &str,
        role: UserRole,
        device_info: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<TokenPair, SessionError> {
        let now = self.clock.now();
        let session = Session::new(
            user_id,
            email,
            role,
            device_info,
            ip_address,
            now,
            &self.config,
        );
        let refresh_token = session.refresh_token.clone();
        let access_token = self.codec.sign_access_token(&session, now)?;

        let evicted = self.storage.insert(session, now).await?;
        for old in &evicted {
            info!(
                "Evicted session {} of user {} to stay within the session cap",
                old.session_id, user_id
            );
        }

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Authenticate a bearer token. The hot path: called on every protected
    /// request.
    pub async fn validate_access_token(&self, token: &str) -> Option<SessionInfo> {
        match self.authenticate(token).await {
            Ok(info) => Some(info),
            Err(reason) => {
                debug!("Rejected access token: {}", reason);
                None
            }
        }
    }

    async fn authenticate(&self, token: &str) -> Result<SessionInfo, SessionError> {
        let claims = self.codec.verify_access_token(token)?;
        let session_id =
            Uuid::parse_str(&claims.sid).map_err(|_| SessionError::InvalidToken)?;

        let now = self.clock.now();
        let session = self
            .storage
            .get(session_id)
            .await
            .ok_or(SessionError::SessionNotFound)?;

        if !session.is_live(now) {
            self.storage.remove(session_id).await;
            return Err(SessionError::SessionExpired);
        }

        let session = self
            .storage
            .touch(session_id, now)
            .await
            .ok_or(SessionError::SessionNotFound)?;
        Ok(session.to_info())
    }

    /// Exchange a refresh token for a fresh access token. The refresh token
    /// itself is not rotated: the caller gets the same one back.
    pub async fn refresh_session(&self, refresh_token: &str) -> Option<TokenPair> {
        match self.reissue(refresh_token).await {
            Ok(pair) => Some(pair),
            Err(reason) => {
                debug!("Rejected refresh token: {}", reason);
                None
            }
        }
    }

    async fn reissue(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let now = self.clock.now();
        let session = self
            .storage
            .find_by_refresh_token(refresh_token)
            .await
            .ok_or(SessionError::SessionNotFound)?;

        if !session.is_live(now) {
            self.storage.remove(session.session_id).await;
            return Err(SessionError::SessionExpired);
        }

        let session = self
            .storage
            .touch(session.session_id, now)
            .await
            .ok_or(SessionError::SessionNotFound)?;
        let access_token = self.codec.sign_access_token(&session, now)?;

        Ok(TokenPair {
            access_token,
            refresh_token: session.refresh_token,
        })
    }

    /// Revoke a single session ("log out this device"). Idempotent.
    pub async fn destroy_session(&self, session_id: Uuid) -> bool {
        self.storage.remove(session_id).await
    }

    /// Revoke every session a user holds ("log out everywhere"); returns
    /// how many were destroyed.
    pub async fn destroy_all_user_sessions(&self, user_id: &str) -> usize {
        self.storage.remove_user_sessions(user_id).await
    }

    /// Enumerate a user's live sessions, most recent activity first.
    pub async fn get_user_sessions(&self, user_id: &str) -> Vec<SessionInfo> {
        let now = self.clock.now();
        let mut sessions = self.storage.list_by_user(user_id, now).await;
        sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        sessions.iter().map(Session::to_info).collect()
    }

    /// Counts for operational dashboards.
    pub async fn get_stats(&self) -> SessionStats {
        self.storage.stats(self.clock.now()).await
    }

    /// Run one expiry sweep on demand; the background task does the same
    /// thing on a timer.
    pub async fn sweep_expired_sessions(&self) -> usize {
        self.storage.cleanup_expired(self.clock.now()).await
    }
}
