//! Transfer service: caller-side validation in front of the transfer core.
//!
//! The core ([`crate::store::transfer_tx`]) guarantees atomicity but does
//! not re-check business rules, so everything about whether a transfer is
//! allowed happens here: positive amount, distinct accounts, both accounts
//! exist, currencies match, and the source can afford the debit.
//!
//! These checks read committed state outside the transfer transaction. A
//! concurrent transfer can still race the sufficient-funds check; the
//! no-negative-balance rule is enforced at this layer, not by the store.

use crate::error::AppError;
use crate::models::account::{Account, is_supported_currency};
use crate::models::transfer::TransferRequest;
use crate::store::{LedgerStore, StoreError, TransferTxParams, TransferTxResult, transfer_tx};

/// Validate a transfer request and execute it atomically.
///
/// # Errors
///
/// - `InvalidRequest`: non-positive amount, unsupported currency, or
///   source and destination are the same account
/// - `AccountNotFound`: either account does not exist
/// - `CurrencyMismatch`: an account carries a different currency
/// - `InsufficientBalance`: the source cannot cover the amount
/// - anything the store surfaces while executing the transaction
pub async fn create_transfer(
    store: &dyn LedgerStore,
    request: TransferRequest,
) -> Result<TransferTxResult, AppError> {
    if request.amount_cents <= 0 {
        return Err(AppError::InvalidRequest(
            "amount_cents must be positive".to_string(),
        ));
    }

    if !is_supported_currency(&request.currency) {
        return Err(AppError::InvalidRequest(format!(
            "unsupported currency: {}",
            request.currency
        )));
    }

    if request.from_account_id == request.to_account_id {
        return Err(AppError::InvalidRequest(
            "cannot transfer to the same account".to_string(),
        ));
    }

    // The source must afford the debit; the destination only needs to exist
    // and carry the right currency.
    validate_account(
        store,
        request.from_account_id,
        &request.currency,
        -request.amount_cents,
    )
    .await?;
    validate_account(
        store,
        request.to_account_id,
        &request.currency,
        request.amount_cents,
    )
    .await?;

    let result = transfer_tx(
        store,
        TransferTxParams {
            from_account_id: request.from_account_id,
            to_account_id: request.to_account_id,
            amount_cents: request.amount_cents,
        },
    )
    .await?;

    Ok(result)
}

/// Check that an account exists, carries the expected currency, and would
/// not go negative after `amount_cents` is applied.
async fn validate_account(
    store: &dyn LedgerStore,
    account_id: i64,
    currency: &str,
    amount_cents: i64,
) -> Result<Account, AppError> {
    let account = match store.get_account(account_id).await {
        Ok(account) => account,
        Err(StoreError::NotFound) => return Err(AppError::AccountNotFound),
        Err(err) => return Err(err.into()),
    };

    if account.currency != currency {
        return Err(AppError::CurrencyMismatch {
            account_id,
            expected: currency.to_string(),
            actual: account.currency,
        });
    }

    if account.balance + amount_cents < 0 {
        return Err(AppError::InsufficientBalance { account_id });
    }

    Ok(account)
}
