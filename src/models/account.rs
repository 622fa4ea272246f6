//! Account data model and API request/response types.
//!
//! This module defines:
//! - `Account`: database entity representing a bank account
//! - `CreateAccountRequest`: request body for creating accounts
//! - `AccountResponse`: response body returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Currencies the service accepts.
///
/// Kept as a whitelist rather than full ISO 4217 validation; multi-currency
/// conversion is out of scope, accounts simply carry a code.
pub const SUPPORTED_CURRENCIES: &[&str] = &["USD", "EUR", "CAD"];

/// Whether `currency` is one of the supported codes.
pub fn is_supported_currency(currency: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&currency)
}

/// Represents an account record from the database.
///
/// # Balance Storage
///
/// Balances are stored as `i64` cents to avoid floating-point precision
/// issues. For example, $10.50 is stored as 1050.
///
/// The balance is mutated exclusively through the store's atomic increment
/// operation inside an active transaction; account rows are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: i64,

    /// Username of the customer who owns this account
    pub owner: String,

    /// Current balance in cents (not dollars)
    pub balance: i64,

    /// Currency code (ISO 4217, 3 letters)
    pub currency: String,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "owner": "alice",
///   "currency": "USD",
///   "initial_balance_cents": 10000
/// }
/// ```
///
/// # Validation
///
/// - `owner`: required, must name an existing user
/// - `currency`: optional, defaults to "USD", must be supported
/// - `initial_balance_cents`: optional, defaults to 0, must not be negative
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Username of the owning customer
    pub owner: String,

    /// Currency code (defaults to "USD" if not provided)
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Opening balance in cents (defaults to 0 if not provided)
    #[serde(default)]
    pub initial_balance_cents: i64,
}

/// Default currency value when not specified in request.
fn default_currency() -> String {
    "USD".to_string()
}

/// Response body for account endpoints.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account unique identifier
    pub id: i64,

    /// Owning customer's username
    pub owner: String,

    /// Current balance in cents
    pub balance: i64,

    /// Currency code
    pub currency: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            owner: account.owner,
            balance: account.balance,
            currency: account.currency,
            created_at: account.created_at,
        }
    }
}
