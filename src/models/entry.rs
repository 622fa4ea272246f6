//! Ledger entry model.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One signed balance movement against exactly one account.
///
/// Entries are immutable once created and always belong to a transfer: the
/// debit side carries a negative amount, the credit side a positive one.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Entry {
    /// Unique identifier for this entry
    pub id: i64,

    /// Account this movement applies to
    pub account_id: i64,

    /// Signed amount in cents (negative for debits)
    pub amount_cents: i64,

    /// Timestamp when the entry was created
    pub created_at: DateTime<Utc>,
}
