//! Password hashing for user creation.
//!
//! Passwords are hashed with Argon2id using a per-password random salt, so
//! two users with the same password never share a hash. Only the encoded
//! hash string is stored.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

/// Hash a plaintext password into an encoded Argon2id hash string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::PasswordHash)?;
    Ok(hash.to_string())
}
