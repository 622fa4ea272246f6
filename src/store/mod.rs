//! Ledger store: the persistence contract and the transactional transfer
//! core.
//!
//! The rest of the service consumes storage only through the [`LedgerStore`]
//! and [`LedgerTx`] traits, which cover transaction scoping, point reads and
//! inserts, and an atomic balance increment. [`transfer_tx`] builds the
//! money-movement transaction on top of that contract, so it runs unchanged
//! against PostgreSQL ([`postgres::SqlStore`]) and the in-memory store the
//! test suite runs on (`memory::MemoryStore`).
//!
//! # Atomicity
//!
//! A transfer is one transaction: the transfer row, both ledger entries, and
//! both balance updates commit together or not at all. Implementations must
//! roll an open transaction back when it is dropped, so a cancelled request
//! (client disconnect, task abort) never leaves partial state behind.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::account::Account;
use crate::models::api_key::ApiKey;
use crate::models::entry::Entry;
use crate::models::transfer::Transfer;
use crate::models::user::User;

/// Errors surfaced by ledger store implementations.
///
/// # Taxonomy
///
/// - `NotFound`: a referenced row does not exist
/// - `Conflict`: a uniqueness or referential constraint was violated
/// - `Unavailable`: transient storage failure; the caller may retry the
///   whole operation (the store itself never retries)
/// - `Database`: any other driver error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Parameters for inserting a user row.
#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub hashed_password: String,
    pub full_name: String,
    pub email: String,
}

/// Parameters for inserting an account row.
#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub owner: String,
    pub balance: i64,
    pub currency: String,
}

/// Parameters for inserting an entry row inside a transaction.
#[derive(Debug, Clone, Copy)]
pub struct CreateEntryParams {
    pub account_id: i64,
    pub amount_cents: i64,
}

/// Parameters for inserting a transfer row inside a transaction.
#[derive(Debug, Clone, Copy)]
pub struct CreateTransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount_cents: i64,
}

/// Input to [`transfer_tx`].
#[derive(Debug, Clone, Copy)]
pub struct TransferTxParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount_cents: i64,
}

/// Everything a committed transfer produced: the transfer row, both ledger
/// entries, and both accounts with their post-transfer balances.
///
/// Not persisted as such; assembled as the return value of one orchestration
/// call and serialized straight into the API response.
#[derive(Debug, Serialize)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

/// Shared handle to the ledger store, cloned into every request handler.
pub type SharedStore = Arc<dyn LedgerStore>;

/// Storage capability the service depends on.
///
/// Methods outside [`LedgerStore::begin`] are single-statement operations
/// against committed state. Multi-statement work goes through `begin` and
/// the returned [`LedgerTx`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Cheap connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Open a transaction scope.
    ///
    /// The transaction commits only through [`LedgerTx::commit`]; dropping
    /// it (explicitly via [`LedgerTx::rollback`] or implicitly on any exit
    /// path) must discard all of its writes.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, StoreError>;
    async fn get_account(&self, id: i64) -> Result<Account, StoreError>;
    async fn list_accounts(&self, limit: i64, offset: i64) -> Result<Vec<Account>, StoreError>;

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError>;

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError>;

    async fn create_user(&self, arg: CreateUserParams) -> Result<User, StoreError>;
    async fn get_user(&self, username: &str) -> Result<User, StoreError>;

    /// Look up an active API key by the SHA-256 hex hash of the raw key.
    async fn get_api_key_by_hash(&self, key_hash: &str) -> Result<ApiKey, StoreError>;
}

/// Operations available inside one open transaction.
#[async_trait]
pub trait LedgerTx: Send {
    async fn create_transfer(&mut self, arg: CreateTransferParams) -> Result<Transfer, StoreError>;

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, StoreError>;

    /// Atomically add `amount_cents` to the account's balance and return the
    /// updated row.
    ///
    /// This is a single indivisible read-modify-write applied by the storage
    /// engine (`balance = balance + delta`), not a read followed by a write,
    /// so two concurrent transactions touching the same account can never
    /// both observe a stale balance.
    async fn add_account_balance(
        &mut self,
        account_id: i64,
        amount_cents: i64,
    ) -> Result<Account, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Move `amount_cents` from one account to another as a single atomic
/// transaction.
///
/// Inserts the transfer row, a debit entry against the source, a credit
/// entry against the destination, and applies both balance deltas, then
/// commits. On any failure the whole transaction rolls back: no orphan
/// transfer or entry rows, no partial balance change.
///
/// Business rules (sufficient funds, currency match, distinct accounts) are
/// the caller's concern; this function only guarantees atomicity, and is
/// safe for concurrent invocation from any number of tasks. There are no
/// internal retries and no idempotency key.
pub async fn transfer_tx(
    store: &dyn LedgerStore,
    arg: TransferTxParams,
) -> Result<TransferTxResult, StoreError> {
    let mut tx = store.begin().await?;

    match run_transfer(tx.as_mut(), &arg).await {
        Ok(result) => {
            tx.commit().await?;
            Ok(result)
        }
        Err(err) => {
            // Surface the original failure even if the rollback itself fails.
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed after transfer error");
            }
            Err(err)
        }
    }
}

async fn run_transfer(
    tx: &mut dyn LedgerTx,
    arg: &TransferTxParams,
) -> Result<TransferTxResult, StoreError> {
    let transfer = tx
        .create_transfer(CreateTransferParams {
            from_account_id: arg.from_account_id,
            to_account_id: arg.to_account_id,
            amount_cents: arg.amount_cents,
        })
        .await?;

    // Debit the sender, credit the recipient. The two amounts sum to zero.
    let from_entry = tx
        .create_entry(CreateEntryParams {
            account_id: arg.from_account_id,
            amount_cents: -arg.amount_cents,
        })
        .await?;

    let to_entry = tx
        .create_entry(CreateEntryParams {
            account_id: arg.to_account_id,
            amount_cents: arg.amount_cents,
        })
        .await?;

    // Update both balances with the lower account id first, regardless of
    // transfer direction. Row locks taken in a fixed global order cannot
    // form a wait cycle, so opposing transfers between the same pair of
    // accounts serialize instead of deadlocking.
    let (from_account, to_account) = if arg.from_account_id < arg.to_account_id {
        apply_deltas(
            tx,
            arg.from_account_id,
            -arg.amount_cents,
            arg.to_account_id,
            arg.amount_cents,
        )
        .await?
    } else {
        let (to_account, from_account) = apply_deltas(
            tx,
            arg.to_account_id,
            arg.amount_cents,
            arg.from_account_id,
            -arg.amount_cents,
        )
        .await?;
        (from_account, to_account)
    };

    Ok(TransferTxResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

/// Apply two signed balance deltas inside the caller's open transaction, in
/// the order given.
///
/// The caller is responsible for ordering: [`transfer_tx`] always passes the
/// numerically smaller account id first.
async fn apply_deltas(
    tx: &mut dyn LedgerTx,
    account_id1: i64,
    amount_cents1: i64,
    account_id2: i64,
    amount_cents2: i64,
) -> Result<(Account, Account), StoreError> {
    let account1 = tx.add_account_balance(account_id1, amount_cents1).await?;
    let account2 = tx.add_account_balance(account_id2, amount_cents2).await?;
    Ok((account1, account2))
}
