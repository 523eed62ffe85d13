/// Refresh Token Rotation
///
/// A refresh token is accepted only while it is the value stored on the
/// identity. Every successful refresh overwrites that value, so a token
/// that has been rotated away (or cleared by logout) can never be used
/// again:
///
/// extracted -> signature/expiry verified -> identity resolved
///   -> matches stored token -> new pair issued and swapped in

use crate::auth::jwt::{TokenIssuer, TokenPair};
use crate::error::{AppError, AuthError, TokenKind};
use crate::store::UserStore;

/// Pick the refresh token from the cookie, falling back to the request body
pub fn extract_refresh_token(cookie: Option<&str>, body: Option<&str>) -> Option<String> {
    cookie
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| body.map(str::trim).filter(|t| !t.is_empty()))
        .map(str::to_string)
}

/// Exchange a refresh token for a new access/refresh pair
///
/// # Errors
/// All failures are `AppError::Auth`:
/// - `MissingToken` when no token was presented
/// - `TokenExpired` / `TokenInvalid` from signature verification
/// - `UnknownIdentity` when the subject no longer exists
/// - `RefreshTokenReused` when the token is not the stored one, including
///   when a concurrent refresh swapped it out first
pub async fn rotate_refresh_token(
    store: &dyn UserStore,
    issuer: &TokenIssuer,
    incoming: Option<&str>,
) -> Result<TokenPair, AppError> {
    let incoming = incoming.ok_or(AuthError::MissingToken)?;

    let claims = issuer.verify_refresh_token(incoming)?;
    let user_id = claims.user_id()?;

    let identity = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UnknownIdentity(TokenKind::Refresh))?;

    if identity.refresh_token.as_deref() != Some(incoming) {
        tracing::warn!(user_id = %user_id, "Refresh token does not match stored token");
        return Err(AuthError::RefreshTokenReused.into());
    }

    let pair = issuer.issue_pair(&identity)?;

    if !store
        .swap_refresh_token(identity.id, incoming, &pair.refresh_token)
        .await?
    {
        tracing::warn!(user_id = %user_id, "Lost refresh rotation race");
        return Err(AuthError::RefreshTokenReused.into());
    }

    tracing::debug!(user_id = %user_id, "Refresh token rotated");
    Ok(pair)
}
