/// Request authentication
///
/// Resolves the identity behind an access token. The actix wiring lives in
/// `middleware::JwtMiddleware`; this module is framework-free.

use crate::auth::jwt::TokenIssuer;
use crate::error::{AppError, AuthError, TokenKind};
use crate::identity::PublicIdentity;
use crate::store::UserStore;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Pick the access token from the cookie, falling back to
/// `Authorization: Bearer <token>`. Blank values count as absent.
pub fn extract_access_token(cookie: Option<&str>, authorization: Option<&str>) -> Option<String> {
    let from_cookie = cookie.map(str::trim).filter(|t| !t.is_empty());
    let from_header = authorization
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    from_cookie.or(from_header).map(str::to_string)
}

/// Verify the access token and load the identity it names.
/// The returned identity never carries the password hash or refresh token.
pub async fn authenticate(
    store: &dyn UserStore,
    issuer: &TokenIssuer,
    token: Option<&str>,
) -> Result<PublicIdentity, AppError> {
    let token = token.ok_or(AuthError::MissingToken)?;
    let claims = issuer.verify_access_token(token)?;
    let user_id = claims.user_id()?;

    let identity = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UnknownIdentity(TokenKind::Access))?;

    Ok(identity.to_public())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::JwtSettings;
    use crate::identity::NewIdentity;
    use crate::store::InMemoryUserStore;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(JwtSettings {
            access_token_secret: "gate-access-secret".to_string(),
            access_token_expiry: 60,
            refresh_token_secret: "gate-refresh-secret".to_string(),
            refresh_token_expiry: 3600,
            issuer: "test".to_string(),
        })
    }

    async fn store_with_alice() -> (InMemoryUserStore, crate::identity::Identity) {
        let store = InMemoryUserStore::new();
        let alice = store
            .create(NewIdentity {
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                display_name: "Alice".to_string(),
                password_hash: "$2b$04$hash".to_string(),
            })
            .await
            .unwrap();
        (store, alice)
    }

    fn auth_error(result: Result<PublicIdentity, AppError>) -> AuthError {
        match result {
            Err(AppError::Auth(e)) => e,
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[test]
    fn cookie_takes_precedence_over_header() {
        let token = extract_access_token(Some("from-cookie"), Some("Bearer from-header"));
        assert_eq!(token.as_deref(), Some("from-cookie"));
    }

    #[test]
    fn header_is_used_without_cookie() {
        assert_eq!(
            extract_access_token(None, Some("Bearer abc")).as_deref(),
            Some("abc")
        );
        assert_eq!(
            extract_access_token(Some(""), Some("Bearer abc")).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn non_bearer_or_blank_values_are_absent() {
        assert!(extract_access_token(None, Some("Basic abc")).is_none());
        assert!(extract_access_token(None, Some("Bearer   ")).is_none());
        assert!(extract_access_token(None, None).is_none());
    }

    #[tokio::test]
    async fn valid_token_resolves_identity() {
        let (store, alice) = store_with_alice().await;
        let issuer = issuer();
        let token = issuer.issue_access_token(&alice).unwrap();

        let identity = authenticate(&store, &issuer, Some(token.as_str())).await.unwrap();

        assert_eq!(identity.id, alice.id);
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let (store, _) = store_with_alice().await;
        let err = auth_error(authenticate(&store, &issuer(), None).await);
        assert_eq!(err, AuthError::MissingToken);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let (store, alice) = store_with_alice().await;
        let issuer = issuer();
        let refresh = issuer.issue_refresh_token(&alice).unwrap();

        let err = auth_error(authenticate(&store, &issuer, Some(refresh.as_str())).await);
        assert_eq!(err, AuthError::TokenInvalid(TokenKind::Access));
    }

    #[tokio::test]
    async fn deleted_identity_is_rejected() {
        let (store, alice) = store_with_alice().await;
        let issuer = issuer();
        let token = issuer.issue_access_token(&alice).unwrap();
        store.remove(alice.id).await;

        let err = auth_error(authenticate(&store, &issuer, Some(token.as_str())).await);
        assert_eq!(err, AuthError::UnknownIdentity(TokenKind::Access));
    }
}
