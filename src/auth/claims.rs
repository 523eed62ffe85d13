/// JWT Claims structures
///
/// Access tokens carry the identity's public fields, refresh tokens carry
/// only the subject. Both include a random `jti` so two tokens minted in
/// the same second are never identical.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, TokenKind};
use crate::identity::Identity;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (identity ID as UUID string)
    pub sub: String,
    pub email: String,
    pub username: String,
    pub fullname: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

/// JWT Claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

impl AccessClaims {
    /// # Arguments
    /// * `identity` - Identity the token is issued for
    /// * `expiry_seconds` - Token expiration in seconds from now
    /// * `issuer` - Issuer identifier
    pub fn new(identity: &Identity, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            username: identity.username.clone(),
            fullname: identity.display_name.clone(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        parse_subject(&self.sub, TokenKind::Access)
    }
}

impl RefreshClaims {
    pub fn new(identity: &Identity, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: identity.id.to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        parse_subject(&self.sub, TokenKind::Refresh)
    }
}

fn parse_subject(sub: &str, kind: TokenKind) -> Result<Uuid, AuthError> {
    Uuid::parse_str(sub).map_err(|_| AuthError::TokenInvalid(kind))
}
