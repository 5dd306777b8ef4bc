use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
}

/// Claims embedded in a signed access token.
///
/// `sid` names the session the token was minted for; whether that session
/// still exists is the store's question, not the token's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub sid: String, // Session ID
    pub email: String,
    pub role: UserRole,
    pub iat: usize, // Issued at
    pub exp: usize, // Expiration time
}
