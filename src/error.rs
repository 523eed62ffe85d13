/// Error Handling Module
///
/// One error type per concern, unified under `AppError`:
/// 1. Domain error enums (validation, store, auth, upload, config)
/// 2. `AppError` used for control flow in every operation
/// 3. HTTP mapping into the `{statusCode, data, message, success, errors}` envelope
/// 4. Structured error logging, keyed by request id and error id

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
    /// Free-form rule violation, message is shown to the client as-is
    Rule(String),
    /// Body could not be parsed. The parser detail is kept for logs only.
    MalformedBody(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::Rule(msg) => write!(f, "{}", msg),
            ValidationError::MalformedBody(_) => write!(f, "Request body is not valid JSON"),
        }
    }
}

impl StdError for ValidationError {}

/// Identity store errors
#[derive(Debug)]
pub enum StoreError {
    /// Unique username/email constraint violated
    Duplicate(String),
    Unavailable(String),
    Query(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Duplicate(msg) => write!(f, "Duplicate entry: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Query(msg) => write!(f, "Store query error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::Duplicate(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// Object store (media upload) errors
#[derive(Debug)]
pub enum UploadError {
    MissingFile(String),
    Io(String),
    Rejected(String),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::MissingFile(what) => write!(f, "{} file is missing", what),
            UploadError::Io(msg) => write!(f, "Upload I/O error: {}", msg),
            UploadError::Rejected(msg) => write!(f, "Upload rejected: {}", msg),
        }
    }
}

impl StdError for UploadError {}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Io(err.to_string())
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Which of the two bearer credentials an auth error is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Authentication errors. Every variant surfaces as 401.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    MissingToken,
    TokenExpired(TokenKind),
    TokenInvalid(TokenKind),
    /// Token verified but its subject no longer exists
    UnknownIdentity(TokenKind),
    /// Refresh token does not match the stored one (already rotated or logged out)
    RefreshTokenReused,
    InvalidCredentials,
    InvalidOldPassword,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Unauthorized request"),
            AuthError::TokenExpired(TokenKind::Access) => write!(f, "Access token has expired"),
            AuthError::TokenExpired(TokenKind::Refresh) => write!(f, "Refresh token has expired"),
            AuthError::TokenInvalid(kind) | AuthError::UnknownIdentity(kind) => {
                write!(f, "Invalid {} token", kind)
            }
            AuthError::RefreshTokenReused => write!(f, "Refresh token is expired or used"),
            AuthError::InvalidCredentials => write!(f, "Invalid user credentials"),
            AuthError::InvalidOldPassword => write!(f, "Invalid old password"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that every operation returns
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Store(StoreError),
    Auth(AuthError),
    Upload(UploadError),
    NotFound(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Upload(e) => write!(f, "{}", e),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::Upload(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Upload(UploadError::MissingFile(_)) => StatusCode::BAD_REQUEST,
            AppError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client. Server-side failures get a generic text.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Store(StoreError::Duplicate(_)) => {
                "User with same email or username already exists".to_string()
            }
            AppError::Store(_) | AppError::Internal(_) => {
                "Something went wrong".to_string()
            }
            AppError::Upload(UploadError::MissingFile(_)) => self.to_string(),
            AppError::Upload(_) => "Error while uploading file".to_string(),
            _ => self.to_string(),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error envelope sent to clients
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub data: Option<()>,
    pub message: String,
    pub success: bool,
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: String, errors: Vec<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data: None,
            message,
            success: false,
            errors,
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self) -> (StatusCode, ErrorResponse);
    /// One log entry per failed request, written by `logger::LoggerMiddleware`
    fn log_error(&self, error_id: &str, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self) -> (StatusCode, ErrorResponse) {
        let status = self.status();
        let errors = match self {
            AppError::Validation(e) => vec![e.to_string()],
            _ => Vec::new(),
        };
        (status, ErrorResponse::new(status, self.public_message(), errors))
    }

    fn log_error(&self, error_id: &str, request_id: &str) {
        match self {
            AppError::Validation(ValidationError::MalformedBody(detail)) => {
                tracing::warn!(error_id, request_id, error = %detail, "Malformed request body");
            }
            AppError::Validation(e) => {
                tracing::warn!(error_id, request_id, error = %e, "Validation error");
            }
            AppError::Store(StoreError::Duplicate(_)) => {
                tracing::warn!(error_id, request_id, error = %self, "Duplicate identity attempt");
            }
            AppError::Store(e) => {
                tracing::error!(error_id, request_id, error = %e, "Store error");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(error_id, request_id, "Invalid credentials attempt");
            }
            AppError::Auth(AuthError::RefreshTokenReused) => {
                tracing::warn!(error_id, request_id, "Stale refresh token presented");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id, request_id, error = %e, "Authentication error");
            }
            AppError::Upload(e) => {
                tracing::error!(error_id, request_id, error = %e, "Upload error");
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_id, request_id, error = %msg, "Not found");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id, request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, body) = <Self as ErrorHandler>::error_response(self);
        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.status()
    }
}
