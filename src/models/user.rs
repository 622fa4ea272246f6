//! User data model and API request/response types.
//!
//! Users are the bank's customers; accounts reference them by username.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a user record from the database.
///
/// The password is stored only as an Argon2id hash. This struct never leaves
/// the service; responses use [`UserResponse`], which omits the hash.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Unique username, 3-20 alphanumeric characters
    pub username: String,

    /// Argon2id hash of the user's password
    pub hashed_password: String,

    /// Display name
    pub full_name: String,

    /// Contact email, unique per user
    pub email: String,

    /// Timestamp of the last password change
    pub password_changed_at: DateTime<Utc>,

    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a new user.
///
/// # JSON Example
///
/// ```json
/// {
///   "username": "alice",
///   "password": "secret1",
///   "full_name": "Alice Example",
///   "email": "alice@example.com"
/// }
/// ```
///
/// # Validation
///
/// - `username`: 3-20 alphanumeric characters
/// - `password`: at least 6 characters
/// - `full_name`: 3-50 characters
/// - `email`: must contain an `@`
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
}

/// Response body for user endpoints.
///
/// Identical to [`User`] minus the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            password_changed_at: user.password_changed_at,
            created_at: user.created_at,
        }
    }
}
