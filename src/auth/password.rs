/// Password Hashing and Verification
///
/// bcrypt with a configurable cost. Strength rules live in `validators`
/// and are applied by the caller before hashing.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// Hash a password using bcrypt
///
/// # Arguments
/// * `password` - Plain text password to hash
/// * `cost` - bcrypt cost factor (4..=31)
///
/// # Errors
/// Returns `AppError::Internal` if bcrypt rejects the cost or fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// Mismatch returns `false`. A malformed stored hash is logged and also
/// treated as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::error!(error = %e, "Stored password hash could not be verified");
            false
        }
    }
}
