/// Authentication module
///
/// Password hashing, access/refresh token issuance, request authentication,
/// refresh token rotation and the account flows built on top of them.

mod claims;
pub mod gate;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use claims::{AccessClaims, RefreshClaims};
pub use gate::{authenticate, extract_access_token, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use jwt::{TokenIssuer, TokenPair};
pub use password::{hash_password, verify_password};
pub use refresh_token::{extract_refresh_token, rotate_refresh_token};
pub use service::{AuthService, LoginInput, LoginOutcome, RegisterInput};
