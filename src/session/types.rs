// Session types and data structures

use crate::models::UserRole;
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the opaque refresh token secret.
const REFRESH_TOKEN_LEN: usize = 64;

/// Session configuration
///
/// These are fixed constants of the deployment, held in a struct so tests
/// can shrink them.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum concurrent sessions per user
    pub max_sessions_per_user: usize,
    /// Access token lifetime (short)
    pub access_token_ttl_secs: i64,
    /// Refresh token / session lifetime (long, absolute ceiling)
    pub refresh_token_ttl_secs: i64,
    /// Interval between expiry sweeps
    pub cleanup_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_user: 5,
            access_token_ttl_secs: 900,        // 15 minutes
            refresh_token_ttl_secs: 7 * 86400, // 7 days
            cleanup_interval_secs: 300,        // 5 minutes
        }
    }
}

/// Active user session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub session_id: Uuid,
    /// User ID
    pub user_id: String,
    /// Email of the authenticated principal
    pub email: String,
    /// Role of the authenticated principal
    pub role: UserRole,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Last successful validation or refresh
    pub last_activity: DateTime<Utc>,
    /// Absolute expiry; never extended by activity
    pub expires_at: DateTime<Utc>,
    /// Opaque secret required to mint new access tokens for this session
    pub refresh_token: String,
    /// Device description, informational only
    pub device_info: Option<String>,
    /// IP address the session was created from, informational only
    pub ip_address: Option<String>,
}

impl Session {
    /// Create a new session with a fresh id and refresh token.
    pub fn new(
        user_id: &str,
        email: &str,
        role: UserRole,
        device_info: Option<&str>,
        ip_address: Option<&str>,
        now: DateTime<Utc>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            email: email.to_string(),
            role,
            created_at: now,
            last_activity: now,
            expires_at: now + Duration::seconds(config.refresh_token_ttl_secs),
            refresh_token: generate_refresh_token(),
            device_info: device_info.map(|s| s.to_string()),
            ip_address: ip_address.map(|s| s.to_string()),
        }
    }

    /// Check whether the session is still within its absolute lifetime.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at >= now
    }

    /// Convert to SessionInfo (without the refresh token)
    pub fn to_info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id,
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
            last_activity: self.last_activity,
            expires_at: self.expires_at,
            device_info: self.device_info.clone(),
            ip_address: self.ip_address.clone(),
        }
    }
}

/// Session information for display (never carries the refresh token)
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

/// Issuance result handed back to the login and refresh flows; never stored.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Session statistics for monitoring
#[derive(Debug, Serialize)]
pub struct SessionStats {
    /// Records currently in the store, live or not
    pub total_sessions: usize,
    /// Distinct users with at least one stored session
    pub active_users: usize,
    /// Records past their expiry that the sweeper has not reclaimed yet
    pub expired_sessions: usize,
}

fn generate_refresh_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LEN)
        .map(char::from)
        .collect()
}
