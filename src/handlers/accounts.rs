//! Account management HTTP handlers.
//!
//! - POST /api/v1/accounts - Create a new account
//! - GET /api/v1/accounts/{id} - Get account by ID
//! - GET /api/v1/accounts - List accounts (paginated)
//! - GET /api/v1/accounts/{id}/entries - List an account's ledger entries

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::account::{AccountResponse, CreateAccountRequest, is_supported_currency},
    models::entry::Entry,
    store::{CreateAccountParams, SharedStore, StoreError},
};

/// Pagination parameters shared by the list endpoints.
///
/// `page_id` starts at 1; `page_size` is capped so one request can never
/// drag an unbounded result set out of storage.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page_id: i64,
    pub page_size: i64,
}

impl PageQuery {
    fn validate(&self) -> Result<(), AppError> {
        if self.page_id < 1 {
            return Err(AppError::InvalidRequest(
                "page_id must be at least 1".to_string(),
            ));
        }
        if !(5..=10).contains(&self.page_size) {
            return Err(AppError::InvalidRequest(
                "page_size must be between 5 and 10".to_string(),
            ));
        }
        Ok(())
    }

    fn offset(&self) -> i64 {
        (self.page_id - 1) * self.page_size
    }
}

/// Create a new account.
///
/// # Endpoint
///
/// `POST /api/v1/accounts`
///
/// # Request Body
///
/// ```json
/// {
///   "owner": "alice",
///   "currency": "USD",
///   "initial_balance_cents": 10000
/// }
/// ```
///
/// # Errors
///
/// - 400: unsupported currency or negative opening balance
/// - 404: owner is not an existing user
pub async fn create_account(
    State(store): State<SharedStore>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    if !is_supported_currency(&request.currency) {
        return Err(AppError::InvalidRequest(format!(
            "unsupported currency: {}",
            request.currency
        )));
    }

    if request.initial_balance_cents < 0 {
        return Err(AppError::InvalidRequest(
            "initial_balance_cents must not be negative".to_string(),
        ));
    }

    let account = match store
        .create_account(CreateAccountParams {
            owner: request.owner,
            balance: request.initial_balance_cents,
            currency: request.currency,
        })
        .await
    {
        Ok(account) => account,
        // The owner foreign key is the only constraint on this insert.
        Err(StoreError::Conflict(_)) => return Err(AppError::UserNotFound),
        Err(err) => return Err(err.into()),
    };

    Ok(Json(account.into()))
}

/// Get a specific account by ID.
///
/// # Endpoint
///
/// `GET /api/v1/accounts/{id}`
pub async fn get_account(
    State(store): State<SharedStore>,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = match store.get_account(account_id).await {
        Ok(account) => account,
        Err(StoreError::NotFound) => return Err(AppError::AccountNotFound),
        Err(err) => return Err(err.into()),
    };

    Ok(Json(account.into()))
}

/// List accounts, paginated, ordered by id.
///
/// # Endpoint
///
/// `GET /api/v1/accounts?page_id=1&page_size=5`
pub async fn list_accounts(
    State(store): State<SharedStore>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    page.validate()?;

    let accounts = store.list_accounts(page.page_size, page.offset()).await?;

    let responses: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok(Json(responses))
}

/// List one account's ledger entries, paginated, oldest first.
///
/// # Endpoint
///
/// `GET /api/v1/accounts/{id}/entries?page_id=1&page_size=5`
///
/// Returns 404 if the account itself does not exist, so an empty page and a
/// missing account are distinguishable.
pub async fn list_account_entries(
    State(store): State<SharedStore>,
    Path(account_id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Entry>>, AppError> {
    page.validate()?;

    if let Err(err) = store.get_account(account_id).await {
        return Err(match err {
            StoreError::NotFound => AppError::AccountNotFound,
            other => other.into(),
        });
    }

    let entries = store
        .list_entries(account_id, page.page_size, page.offset())
        .await?;

    Ok(Json(entries))
}
