/// JWT Token Generation and Validation
///
/// `TokenIssuer` signs access tokens and refresh tokens with separate
/// HS256 secrets and lifetimes, and verifies them statelessly
/// (signature, expiry, issuer).

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, TokenKind};
use crate::identity::Identity;

/// Freshly minted access/refresh pair
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: JwtSettings,
}

impl TokenIssuer {
    pub fn new(config: JwtSettings) -> Self {
        Self { config }
    }

    /// Sign `{sub, email, username, fullname}` with the access secret
    pub fn issue_access_token(&self, identity: &Identity) -> Result<String, AppError> {
        let claims = AccessClaims::new(
            identity,
            self.config.access_token_expiry,
            &self.config.issuer,
        );
        sign(&claims, &self.config.access_token_secret, TokenKind::Access)
    }

    /// Sign `{sub}` with the refresh secret
    pub fn issue_refresh_token(&self, identity: &Identity) -> Result<String, AppError> {
        let claims = RefreshClaims::new(
            identity,
            self.config.refresh_token_expiry,
            &self.config.issuer,
        );
        sign(&claims, &self.config.refresh_token_secret, TokenKind::Refresh)
    }

    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(identity)?,
            refresh_token: self.issue_refresh_token(identity)?,
        })
    }

    /// Validate and extract claims from an access token
    ///
    /// # Errors
    /// `TokenExpired` past `exp`, `TokenInvalid` for anything else
    /// (bad signature, wrong issuer, malformed)
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        verify(
            token,
            &self.config.access_token_secret,
            &self.config.issuer,
            TokenKind::Access,
        )
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        verify(
            token,
            &self.config.refresh_token_secret,
            &self.config.issuer,
            TokenKind::Refresh,
        )
    }
}

fn sign<T: Serialize>(claims: &T, secret: &str, kind: TokenKind) -> Result<String, AppError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("{} token generation failed: {}", kind, e)))
}

fn verify<T: DeserializeOwned>(
    token: &str,
    secret: &str,
    issuer: &str,
    kind: TokenKind,
) -> Result<T, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[issuer]);

    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => {
            tracing::debug!(token_kind = %kind, "JWT expired");
            AuthError::TokenExpired(kind)
        }
        _ => {
            tracing::warn!(token_kind = %kind, "JWT validation error: {}", e);
            AuthError::TokenInvalid(kind)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            access_token_secret: "access-secret-key-at-least-32-characters".to_string(),
            access_token_expiry: 3600,
            refresh_token_secret: "refresh-secret-key-at-least-32-characters".to_string(),
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        }
    }

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            display_name: "Alice".to_string(),
            avatar: None,
            cover_image: None,
            password_hash: String::new(),
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let issuer = TokenIssuer::new(get_test_config());
        let identity = identity();

        let token = issuer.issue_access_token(&identity).expect("Failed to generate token");
        let claims = issuer.verify_access_token(&token).expect("Failed to validate token");

        assert_eq!(claims.sub, identity.id.to_string());
        assert_eq!(claims.email, identity.email);
        assert_eq!(claims.username, identity.username);
        assert_eq!(claims.fullname, identity.display_name);
        assert_eq!(claims.iss, "test");
    }

    #[test]
    fn test_issue_and_verify_refresh_token() {
        let issuer = TokenIssuer::new(get_test_config());
        let identity = identity();

        let token = issuer.issue_refresh_token(&identity).unwrap();
        let claims = issuer.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), identity.id);
    }

    #[test]
    fn test_pair_tokens_are_distinct_across_rotations() {
        let issuer = TokenIssuer::new(get_test_config());
        let identity = identity();

        let first = issuer.issue_pair(&identity).unwrap();
        let second = issuer.issue_pair(&identity).unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
        assert_ne!(first.access_token, second.access_token);
    }

    #[test]
    fn test_expired_token() {
        let mut config = get_test_config();
        config.access_token_expiry = -10;
        let issuer = TokenIssuer::new(config);

        let token = issuer.issue_access_token(&identity()).unwrap();
        let result = issuer.verify_access_token(&token);

        assert_eq!(result.unwrap_err(), AuthError::TokenExpired(TokenKind::Access));
    }

    #[test]
    fn test_invalid_token() {
        let issuer = TokenIssuer::new(get_test_config());
        let result = issuer.verify_access_token("invalid.token.here");

        assert_eq!(result.unwrap_err(), AuthError::TokenInvalid(TokenKind::Access));
    }

    #[test]
    fn test_tampered_token() {
        let issuer = TokenIssuer::new(get_test_config());
        let token = issuer.issue_access_token(&identity()).unwrap();

        let tampered = format!("{}X", token);
        assert!(issuer.verify_access_token(&tampered).is_err());
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let issuer = TokenIssuer::new(get_test_config());
        let pair = issuer.issue_pair(&identity()).unwrap();

        assert_eq!(
            issuer.verify_access_token(&pair.refresh_token).unwrap_err(),
            AuthError::TokenInvalid(TokenKind::Access)
        );
        assert_eq!(
            issuer.verify_refresh_token(&pair.access_token).unwrap_err(),
            AuthError::TokenInvalid(TokenKind::Refresh)
        );
    }

    #[test]
    fn test_wrong_issuer() {
        let config = get_test_config();
        let token = TokenIssuer::new(config.clone())
            .issue_access_token(&identity())
            .unwrap();

        let mut other = config;
        other.issuer = "wrong-issuer".to_string();
        let result = TokenIssuer::new(other).verify_access_token(&token);

        assert!(result.is_err());
    }
}
