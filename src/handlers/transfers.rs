//! Transfer HTTP handlers.
//!
//! - POST /api/v1/transfers - Move money between two accounts
//! - GET /api/v1/transfers/{id} - Get transfer details

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    error::AppError,
    models::transfer::{Transfer, TransferRequest},
    services::transfer_service,
    store::{SharedStore, StoreError, TransferTxResult},
};

/// Transfer money between accounts.
///
/// # Endpoint
///
/// `POST /api/v1/transfers`
///
/// # Request Body
///
/// ```json
/// {
///   "from_account_id": 1,
///   "to_account_id": 2,
///   "amount_cents": 30000,
///   "currency": "USD"
/// }
/// ```
///
/// # Atomicity
///
/// The transfer row, both ledger entries, and both balance updates happen
/// in one storage transaction: either everything commits or nothing does.
///
/// # Response (200 OK)
///
/// The full transfer result: the transfer record, both entries, and both
/// accounts with their post-transfer balances.
pub async fn create_transfer(
    State(store): State<SharedStore>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferTxResult>, AppError> {
    let result = transfer_service::create_transfer(store.as_ref(), request).await?;
    Ok(Json(result))
}

/// Get a transfer record by ID.
///
/// # Endpoint
///
/// `GET /api/v1/transfers/{id}`
pub async fn get_transfer(
    State(store): State<SharedStore>,
    Path(transfer_id): Path<i64>,
) -> Result<Json<Transfer>, AppError> {
    let transfer = match store.get_transfer(transfer_id).await {
        Ok(transfer) => transfer,
        Err(StoreError::NotFound) => return Err(AppError::TransferNotFound),
        Err(err) => return Err(err.into()),
    };

    Ok(Json(transfer))
}
