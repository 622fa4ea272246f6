//! Error types and HTTP error response handling.
//!
//! This module defines the application-level errors and how they are
//! converted into HTTP responses with appropriate status codes and JSON
//! bodies. Storage-level errors live in [`crate::store::StoreError`] and are
//! wrapped here before reaching the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Authentication**: invalid or missing API keys
/// - **Resource**: referenced user/account/transfer does not exist
/// - **Business rules**: currency mismatch, insufficient balance
/// - **Validation**: malformed request data
/// - **Storage**: anything surfaced by the ledger store
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// API key is missing, invalid, or inactive.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Requested user does not exist.
    #[error("User not found")]
    UserNotFound,

    /// Requested account does not exist.
    #[error("Account not found")]
    AccountNotFound,

    /// Requested transfer record does not exist.
    #[error("Transfer not found")]
    TransferNotFound,

    /// A user with the same username or email already exists.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("User already exists")]
    UserExists,

    /// An account's currency does not match the currency of the requested
    /// operation.
    #[error("account {account_id} currency mismatch: {actual} vs {expected}")]
    CurrencyMismatch {
        account_id: i64,
        expected: String,
        actual: String,
    },

    /// Account balance is too low for the requested transfer.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("account {account_id} has insufficient balance")]
    InsufficientBalance { account_id: i64 },

    /// Request body or parameters are invalid.
    ///
    /// The String carries details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Password hashing failed.
    ///
    /// Argon2 errors carry no client-actionable detail, so this maps to a
    /// plain 500.
    #[error("Password hashing failed")]
    PasswordHash,

    /// Error surfaced by the ledger store.
    ///
    /// `NotFound`/`Conflict` keep their semantics; everything else is an
    /// internal error whose details are hidden from the client.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convert AppError into an HTTP response.
///
/// Allows handlers to return `Result<T, AppError>` and have errors
/// automatically rendered as:
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_api_key",
                self.to_string(),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AppError::AccountNotFound => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::TransferNotFound => (
                StatusCode::NOT_FOUND,
                "transfer_not_found",
                self.to_string(),
            ),
            AppError::UserExists => (StatusCode::CONFLICT, "user_exists", self.to_string()),
            AppError::CurrencyMismatch { .. } => (
                StatusCode::BAD_REQUEST,
                "currency_mismatch",
                self.to_string(),
            ),
            AppError::InsufficientBalance { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_balance",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::PasswordHash => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
            AppError::Store(store_err) => match store_err {
                StoreError::NotFound => {
                    (StatusCode::NOT_FOUND, "not_found", store_err.to_string())
                }
                StoreError::Conflict(_) => {
                    (StatusCode::CONFLICT, "conflict", store_err.to_string())
                }
                StoreError::Unavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage_unavailable",
                    "Storage is temporarily unavailable".to_string(),
                ),
                StoreError::Database(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                ),
            },
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
