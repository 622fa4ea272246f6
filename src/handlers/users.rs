//! User management HTTP handlers.
//!
//! - POST /api/v1/users - Create a new user
//! - GET /api/v1/users/{username} - Get user by username

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    error::AppError,
    models::user::{CreateUserRequest, UserResponse},
    services::password,
    store::{CreateUserParams, SharedStore, StoreError},
};

/// Create a new user.
///
/// # Endpoint
///
/// `POST /api/v1/users`
///
/// # Request Body
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
/// The password is hashed before it touches storage and is never returned.
///
/// # Errors
///
/// - 400: username/password/full_name/email fail validation
/// - 409: username or email already taken
pub async fn create_user(
    State(store): State<SharedStore>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate_create_user(&request)?;

    let hashed_password = password::hash_password(&request.password)?;

    let user = match store
        .create_user(CreateUserParams {
            username: request.username,
            hashed_password,
            full_name: request.full_name,
            email: request.email,
        })
        .await
    {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => return Err(AppError::UserExists),
        Err(err) => return Err(err.into()),
    };

    Ok(Json(user.into()))
}

/// Get a user by username.
///
/// # Endpoint
///
/// `GET /api/v1/users/{username}`
pub async fn get_user(
    State(store): State<SharedStore>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = match store.get_user(&username).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(AppError::UserNotFound),
        Err(err) => return Err(err.into()),
    };

    Ok(Json(user.into()))
}

fn validate_create_user(request: &CreateUserRequest) -> Result<(), AppError> {
    let username_ok = (3..=20).contains(&request.username.len())
        && request.username.chars().all(|c| c.is_ascii_alphanumeric());
    if !username_ok {
        return Err(AppError::InvalidRequest(
            "username must be 3-20 alphanumeric characters".to_string(),
        ));
    }

    if request.password.len() < 6 {
        return Err(AppError::InvalidRequest(
            "password must be at least 6 characters".to_string(),
        ));
    }

    if !(3..=50).contains(&request.full_name.len()) {
        return Err(AppError::InvalidRequest(
            "full_name must be 3-50 characters".to_string(),
        ));
    }

    if !request.email.contains('@') {
        return Err(AppError::InvalidRequest(
            "email must be a valid address".to_string(),
        ));
    }

    Ok(())
}
