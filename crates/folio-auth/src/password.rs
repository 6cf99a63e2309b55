use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::DirectoryError;

/// Minimum accepted password length for directory accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a new account password. Rejects passwords shorter than
/// [`MIN_PASSWORD_LEN`].
pub fn hash_password(password: &str) -> Result<String, DirectoryError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DirectoryError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DirectoryError::Internal(format!("password hash error: {e}")))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, DirectoryError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| DirectoryError::Internal(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
