/// Authentication Routes
///
/// Registration, login, logout, token refresh and password change.
/// Session tokens travel both as `HttpOnly` cookies and in the JSON body.

use actix_web::http::StatusCode;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    extract_refresh_token, AuthService, LoginInput, RegisterInput, TokenPair, REFRESH_TOKEN_COOKIE,
};
use crate::error::AppError;
use crate::identity::PublicIdentity;
use crate::logger::request_id;
use crate::routes::cookies::{cleared_cookies, token_cookies};
use crate::routes::response::{ApiResponse, Empty};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// User login request; either `username` or `email` identifies the account
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token refresh request, used when the client cannot send cookies
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// Login payload: the user plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    pub user: PublicIdentity,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// POST /api/v1/users/register
///
/// # Errors
/// - 400: missing or malformed field, weak password
/// - 409: username or email already taken
pub async fn register(
    req: HttpRequest,
    form: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id(&req);
    let form = form.into_inner();

    let user = auth
        .register(RegisterInput {
            fullname: form.fullname,
            email: form.email,
            username: form.username,
            password: form.password,
        })
        .await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(ApiResponse::new(
        StatusCode::CREATED,
        user,
        "User registered successfully",
    )))
}

/// POST /api/v1/users/login
///
/// Sets the `accessToken` and `refreshToken` cookies.
///
/// # Errors
/// - 400: neither username nor email, or no password
/// - 404: no such user
/// - 401: wrong password
pub async fn login(
    req: HttpRequest,
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id(&req);
    let form = form.into_inner();

    let outcome = auth
        .login(LoginInput {
            username: form.username,
            email: form.email,
            password: form.password,
        })
        .await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %outcome.user.id,
        "User logged in successfully"
    );

    let [access_cookie, refresh_cookie] = token_cookies(&outcome.tokens);
    Ok(HttpResponse::Ok().cookie(access_cookie).cookie(refresh_cookie).json(ApiResponse::new(
        StatusCode::OK,
        LoginResponse {
            user: outcome.user,
            tokens: outcome.tokens,
        },
        "User logged in successfully",
    )))
}

/// POST /api/v1/users/logout
///
/// Requires the gate. Clears the stored refresh token and both cookies.
pub async fn logout(
    req: HttpRequest,
    user: web::ReqData<PublicIdentity>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id(&req);

    auth.logout(user.id).await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user.id,
        "User logged out"
    );

    let [access_cookie, refresh_cookie] = cleared_cookies();
    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .cookie(refresh_cookie)
        .json(ApiResponse::new(StatusCode::OK, Empty {}, "User logged out")))
}

/// POST /api/v1/users/refresh-token
///
/// Takes the refresh token from the `refreshToken` cookie, or from the JSON
/// body when no cookie is present. Rotates both tokens.
///
/// # Errors
/// - 401: missing, invalid, expired, or already used refresh token
pub async fn refresh(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id(&req);

    let cookie = req.cookie(REFRESH_TOKEN_COOKIE);
    let incoming = extract_refresh_token(
        cookie.as_ref().map(|c| c.value()),
        body.as_ref().and_then(|b| b.refresh_token.as_deref()),
    );

    let tokens = auth.refresh(incoming.as_deref()).await?;

    tracing::info!(request_id = %request_id, "Token refreshed successfully");

    let [access_cookie, refresh_cookie] = token_cookies(&tokens);
    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .cookie(refresh_cookie)
        .json(ApiResponse::new(StatusCode::OK, tokens, "Access token refreshed")))
}

/// POST /api/v1/users/change-password
///
/// Requires the gate. The current session stays valid.
///
/// # Errors
/// - 400: missing field or weak new password
/// - 401: old password does not match
pub async fn change_password(
    req: HttpRequest,
    form: web::Json<ChangePasswordRequest>,
    user: web::ReqData<PublicIdentity>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id(&req);

    auth.change_password(
        user.id,
        form.old_password.as_deref(),
        form.new_password.as_deref(),
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user.id,
        "Password changed successfully"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        Empty {},
        "Password changed successfully",
    )))
}
