use bcrypt::{hash, verify};

/// bcrypt ignores input past this many bytes, so longer passwords are refused.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Hash a password on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        hash(password, cost).map_err(|err| PasswordError::Hashing(err.to_string()))
    })
    .await
    .map_err(|err| PasswordError::Hashing(format!("task join error: {err}")))?
}

/// Check a password against a stored hash on the blocking pool. A malformed
/// stored hash counts as a mismatch.
pub async fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let stored = stored.to_string();
    tokio::task::spawn_blocking(move || verify(password, &stored).unwrap_or(false))
        .await
        .map_err(|err| PasswordError::Hashing(format!("task join error: {err}")))
}
