use thiserror::Error;
use uuid::Uuid;

/// Why an operation on a session failed.
///
/// The manager collapses every caller-facing variant into a plain
/// "not authenticated" answer; callers never learn which one occurred.
/// `DuplicateSessionId` is the exception: it indicates a bug, not a
/// runtime condition.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("access token is malformed or carries a bad signature")]
    InvalidToken,

    #[error("access token is past its embedded expiry")]
    TokenExpired,

    #[error("no session exists for the presented identifier")]
    SessionNotFound,

    #[error("session is past its absolute expiry")]
    SessionExpired,

    #[error("session id {0} already exists in the store")]
    DuplicateSessionId(Uuid),

    #[error("failed to sign access token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}
