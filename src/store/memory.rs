//! In-memory implementation of the ledger store.
//!
//! Implements the same capability set as the PostgreSQL store against plain
//! process memory, so the transfer core and its callers can be exercised
//! without a database. Referential checks mirror the real schema (accounts
//! need an existing owner, entries and transfers need existing accounts),
//! and balance changes go through an undo log so rollback — explicit or via
//! drop — restores the previous state exactly.
//!
//! The store also records the order of balance updates and can inject a
//! failure into entry inserts, which the tests use to observe lock ordering
//! and rollback behavior.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::account::Account;
use crate::models::api_key::ApiKey;
use crate::models::entry::Entry;
use crate::models::transfer::Transfer;
use crate::models::user::User;
use crate::store::{
    CreateAccountParams, CreateEntryParams, CreateTransferParams, CreateUserParams, LedgerStore,
    LedgerTx, StoreError,
};

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    api_keys: Vec<ApiKey>,
    accounts: BTreeMap<i64, Account>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
    next_account_id: i64,
    next_entry_id: i64,
    next_transfer_id: i64,
    next_api_key_id: i64,
    balance_update_log: Vec<i64>,
    // None disables injection; Some(n) lets n more entry inserts succeed
    // before every further insert fails.
    entry_fault_after: Option<u32>,
}

/// Ledger store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("ledger state lock poisoned")
    }

    /// Register an active API key for the given business and return it.
    pub fn seed_api_key(&self, business_name: &str, key_hash: &str) -> ApiKey {
        let mut state = self.lock();
        state.next_api_key_id += 1;
        let api_key = ApiKey {
            id: state.next_api_key_id,
            key_hash: key_hash.to_string(),
            business_name: business_name.to_string(),
            created_at: Utc::now(),
            is_active: true,
        };
        state.api_keys.push(api_key.clone());
        api_key
    }

    /// Let `n` more entry inserts succeed, then fail every further one.
    ///
    /// Used to force a failure partway through a transfer transaction.
    pub fn fail_entry_inserts_after(&self, n: u32) {
        self.lock().entry_fault_after = Some(n);
    }

    /// Snapshot of all committed entries, ordered by id.
    pub fn entries(&self) -> Vec<Entry> {
        let mut entries = self.lock().entries.clone();
        entries.sort_by_key(|e| e.id);
        entries
    }

    /// Snapshot of all committed transfers, ordered by id.
    pub fn transfers(&self) -> Vec<Transfer> {
        let mut transfers = self.lock().transfers.clone();
        transfers.sort_by_key(|t| t.id);
        transfers
    }

    /// Account ids in the order their balances were updated.
    pub fn balance_update_log(&self) -> Vec<i64> {
        self.lock().balance_update_log.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        Ok(Box::new(MemoryTx {
            state: Arc::clone(&self.state),
            staged_transfers: Vec::new(),
            staged_entries: Vec::new(),
            applied_deltas: Vec::new(),
            done: false,
        }))
    }

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, StoreError> {
        let mut state = self.lock();
        if !state.users.contains_key(&arg.owner) {
            return Err(StoreError::Conflict(format!(
                "account owner {} does not exist",
                arg.owner
            )));
        }
        state.next_account_id += 1;
        let account = Account {
            id: state.next_account_id,
            owner: arg.owner,
            balance: arg.balance,
            currency: arg.currency,
            created_at: Utc::now(),
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        self.lock()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_accounts(&self, limit: i64, offset: i64) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .lock()
            .accounts
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        let mut entries: Vec<Entry> = self
            .lock()
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.id);
        Ok(entries
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError> {
        self.lock()
            .transfers
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_user(&self, arg: CreateUserParams) -> Result<User, StoreError> {
        let mut state = self.lock();
        if state.users.contains_key(&arg.username)
            || state.users.values().any(|u| u.email == arg.email)
        {
            return Err(StoreError::Conflict("user already exists".to_string()));
        }
        let user = User {
            username: arg.username.clone(),
            hashed_password: arg.hashed_password,
            full_name: arg.full_name,
            email: arg.email,
            password_changed_at: DateTime::<Utc>::UNIX_EPOCH,
            created_at: Utc::now(),
        };
        state.users.insert(arg.username, user.clone());
        Ok(user)
    }

    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        self.lock()
            .users
            .get(username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_api_key_by_hash(&self, key_hash: &str) -> Result<ApiKey, StoreError> {
        self.lock()
            .api_keys
            .iter()
            .find(|k| k.key_hash == key_hash && k.is_active)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

/// One open in-memory transaction.
///
/// Rows are staged locally and only become visible at commit; balance
/// deltas are applied immediately (mirroring the atomic increment) and
/// recorded in an undo log that rollback and drop replay in reverse.
struct MemoryTx {
    state: Arc<Mutex<State>>,
    staged_transfers: Vec<Transfer>,
    staged_entries: Vec<Entry>,
    applied_deltas: Vec<(i64, i64)>,
    done: bool,
}

impl MemoryTx {
    fn revert(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        self.staged_transfers.clear();
        self.staged_entries.clear();
        let mut state = self.state.lock().expect("ledger state lock poisoned");
        for (account_id, amount_cents) in self.applied_deltas.drain(..).rev() {
            if let Some(account) = state.accounts.get_mut(&account_id) {
                account.balance -= amount_cents;
            }
        }
    }
}

impl Drop for MemoryTx {
    // An abandoned transaction must leave no observable state behind.
    fn drop(&mut self) {
        self.revert();
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn create_transfer(&mut self, arg: CreateTransferParams) -> Result<Transfer, StoreError> {
        let mut state = self.state.lock().expect("ledger state lock poisoned");
        if !state.accounts.contains_key(&arg.from_account_id)
            || !state.accounts.contains_key(&arg.to_account_id)
        {
            return Err(StoreError::Conflict(
                "transfer references a missing account".to_string(),
            ));
        }
        state.next_transfer_id += 1;
        let transfer = Transfer {
            id: state.next_transfer_id,
            from_account_id: arg.from_account_id,
            to_account_id: arg.to_account_id,
            amount_cents: arg.amount_cents,
            created_at: Utc::now(),
        };
        self.staged_transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, StoreError> {
        let mut state = self.state.lock().expect("ledger state lock poisoned");
        if let Some(remaining) = state.entry_fault_after.as_mut() {
            if *remaining == 0 {
                return Err(StoreError::Unavailable(
                    "injected entry insert failure".to_string(),
                ));
            }
            *remaining -= 1;
        }
        if !state.accounts.contains_key(&arg.account_id) {
            return Err(StoreError::Conflict(
                "entry references a missing account".to_string(),
            ));
        }
        state.next_entry_id += 1;
        let entry = Entry {
            id: state.next_entry_id,
            account_id: arg.account_id,
            amount_cents: arg.amount_cents,
            created_at: Utc::now(),
        };
        self.staged_entries.push(entry.clone());
        Ok(entry)
    }

    async fn add_account_balance(
        &mut self,
        account_id: i64,
        amount_cents: i64,
    ) -> Result<Account, StoreError> {
        let mut state = self.state.lock().expect("ledger state lock poisoned");
        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or(StoreError::NotFound)?;
        account.balance += amount_cents;
        let snapshot = account.clone();
        state.balance_update_log.push(account_id);
        self.applied_deltas.push((account_id, amount_cents));
        Ok(snapshot)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        let staged_transfers = std::mem::take(&mut self.staged_transfers);
        let staged_entries = std::mem::take(&mut self.staged_entries);
        self.applied_deltas.clear();
        self.done = true;

        let state = Arc::clone(&self.state);
        let mut state = state.lock().expect("ledger state lock poisoned");
        state.transfers.extend(staged_transfers);
        state.entries.extend(staged_entries);
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), StoreError> {
        self.revert();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{random_email, random_owner, seed_account};

    #[tokio::test]
    async fn account_crud_round_trip() {
        let store = MemoryStore::new();
        let owner = random_owner();
        store
            .create_user(CreateUserParams {
                username: owner.clone(),
                hashed_password: "hash".to_string(),
                full_name: "Test User".to_string(),
                email: random_email(),
            })
            .await
            .unwrap();

        let account = store
            .create_account(CreateAccountParams {
                owner: owner.clone(),
                balance: 250,
                currency: "USD".to_string(),
            })
            .await
            .unwrap();

        let fetched = store.get_account(account.id).await.unwrap();
        assert_eq!(fetched, account);
        assert_eq!(fetched.owner, owner);
        assert_eq!(fetched.balance, 250);

        let listed = store.list_accounts(10, 0).await.unwrap();
        assert_eq!(listed, vec![account]);
    }

    #[tokio::test]
    async fn account_creation_requires_existing_owner() {
        let store = MemoryStore::new();
        let err = store
            .create_account(CreateAccountParams {
                owner: "nobody".to_string(),
                balance: 0,
                currency: "USD".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_user_is_a_conflict() {
        let store = MemoryStore::new();
        let arg = CreateUserParams {
            username: random_owner(),
            hashed_password: "hash".to_string(),
            full_name: "Test User".to_string(),
            email: random_email(),
        };
        store.create_user(arg.clone()).await.unwrap();
        let err = store.create_user(arg).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn rollback_reverts_balance_changes() {
        let store = MemoryStore::new();
        let account = seed_account(&store, 100).await;

        let mut tx = store.begin().await.unwrap();
        let updated = tx.add_account_balance(account.id, 40).await.unwrap();
        assert_eq!(updated.balance, 140);
        tx.rollback().await.unwrap();

        assert_eq!(store.get_account(account.id).await.unwrap().balance, 100);
    }

    #[tokio::test]
    async fn dropping_open_transaction_reverts_balance_changes() {
        let store = MemoryStore::new();
        let account = seed_account(&store, 100).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.add_account_balance(account.id, 40).await.unwrap();
            // dropped without commit
        }

        assert_eq!(store.get_account(account.id).await.unwrap().balance, 100);
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn api_key_lookup_by_hash() {
        let store = MemoryStore::new();
        let seeded = store.seed_api_key("acme", "deadbeef");

        let found = store.get_api_key_by_hash("deadbeef").await.unwrap();
        assert_eq!(found.id, seeded.id);
        assert_eq!(found.business_name, "acme");

        let err = store.get_api_key_by_hash("cafebabe").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
