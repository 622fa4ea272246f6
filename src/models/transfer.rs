//! Transfer data model and API request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A funds movement from one account to another.
///
/// Immutable once created. Each transfer owns exactly two entries: a debit
/// against `from_account_id` and a credit against `to_account_id`, always
/// netting to zero.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Transfer {
    /// Unique identifier for this transfer
    pub id: i64,

    /// Account the money leaves
    pub from_account_id: i64,

    /// Account the money arrives at
    pub to_account_id: i64,

    /// Amount in cents, always positive
    pub amount_cents: i64,

    /// Timestamp when the transfer was created
    pub created_at: DateTime<Utc>,
}

/// Request to transfer money between two accounts.
///
/// # JSON Example
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
/// # Validation
///
/// - Both accounts must exist and carry `currency`
/// - The source account must have sufficient balance
/// - `amount_cents` must be positive
/// - Source and destination must be different accounts
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Account to transfer from (will decrease)
    pub from_account_id: i64,

    /// Account to transfer to (will increase)
    pub to_account_id: i64,

    /// Amount to transfer in cents
    pub amount_cents: i64,

    /// Currency both accounts are expected to carry
    pub currency: String,
}
