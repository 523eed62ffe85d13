use actix_web::cookie::Cookie;

use crate::auth::{TokenPair, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .http_only(true)
        .secure(true)
        .path("/")
        .finish()
}

/// `accessToken` and `refreshToken` cookies for a freshly issued pair
pub fn token_cookies(tokens: &TokenPair) -> [Cookie<'static>; 2] {
    [
        session_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()),
        session_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()),
    ]
}

/// Removal cookies for both session cookies
pub fn cleared_cookies() -> [Cookie<'static>; 2] {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE].map(|name| {
        let mut cookie = session_cookie(name, String::new());
        cookie.make_removal();
        cookie
    })
}
