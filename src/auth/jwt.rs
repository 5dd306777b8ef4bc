use crate::models::Claims;
use crate::session::error::SessionError;
use crate::session::types::Session;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};

/// Signs and verifies access tokens.
///
/// Stateless: a token is valid if its signature checks out and its embedded
/// expiry has not passed. Cross-checking the referenced session against the
/// store is the manager's job.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl_secs: i64,
}

impl TokenCodec {
    pub fn new(secret: &[u8], access_token_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_token_ttl_secs,
        }
    }

    /// Produce a short-lived access token for the given session.
    pub fn sign_access_token(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let claims = Claims {
            sub: session.user_id.clone(),
            sid: session.session_id.to_string(),
            email: session.email.clone(),
            role: session.role,
            iat: now.timestamp() as usize,
            exp: (now + Duration::seconds(self.access_token_ttl_secs)).timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify signature and embedded expiry, returning the claims.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, SessionError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::TokenExpired,
                _ => SessionError::InvalidToken,
            })?;
        Ok(token_data.claims)
    }
}
