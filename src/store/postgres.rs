//! PostgreSQL implementation of the ledger store.
//!
//! All writes use `INSERT ... RETURNING` / `UPDATE ... RETURNING` so the
//! caller gets the row back without a second round trip. The balance change
//! is a single `SET balance = balance + $1` statement: the database applies
//! the increment under its own row lock, which is what makes concurrent
//! transfers safe without optimistic locking.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::db::DbPool;
use crate::models::account::Account;
use crate::models::api_key::ApiKey;
use crate::models::entry::Entry;
use crate::models::transfer::Transfer;
use crate::models::user::User;
use crate::store::{
    CreateAccountParams, CreateEntryParams, CreateTransferParams, CreateUserParams, LedgerStore,
    LedgerTx, StoreError,
};

/// Production store backed by a PostgreSQL connection pool.
pub struct SqlStore {
    pool: DbPool,
}

impl SqlStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Translate driver errors into the store taxonomy.
///
/// Postgres signals uniqueness violations as SQLSTATE 23505 and foreign-key
/// violations as 23503; both are conflicts from the caller's point of view.
fn map_db_err(err: sqlx::Error) -> StoreError {
    if matches!(err, sqlx::Error::RowNotFound) {
        return StoreError::NotFound;
    }
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(db_err.code().as_deref(), Some("23505") | Some("23503")) {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl LedgerStore for SqlStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let tx = self.pool.begin().await.map_err(map_db_err)?;
        Ok(Box::new(SqlTx { tx }))
    }

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (owner, balance, currency)
            VALUES ($1, $2, $3)
            RETURNING id, owner, balance, currency, created_at
            "#,
        )
        .bind(&arg.owner)
        .bind(arg.balance)
        .bind(&arg.currency)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            "SELECT id, owner, balance, currency, created_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(StoreError::NotFound)
    }

    async fn list_accounts(&self, limit: i64, offset: i64) -> Result<Vec<Account>, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner, balance, currency, created_at
            FROM accounts
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, account_id, amount_cents, created_at
            FROM entries
            WHERE account_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError> {
        sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, from_account_id, to_account_id, amount_cents, created_at
            FROM transfers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(StoreError::NotFound)
    }

    async fn create_user(&self, arg: CreateUserParams) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, hashed_password, full_name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING username, hashed_password, full_name, email, password_changed_at, created_at
            "#,
        )
        .bind(&arg.username)
        .bind(&arg.hashed_password)
        .bind(&arg.full_name)
        .bind(&arg.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT username, hashed_password, full_name, email, password_changed_at, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(StoreError::NotFound)
    }

    async fn get_api_key_by_hash(&self, key_hash: &str) -> Result<ApiKey, StoreError> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, key_hash, business_name, created_at, is_active
            FROM api_keys
            WHERE key_hash = $1 AND is_active = true
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(StoreError::NotFound)
    }
}

/// One open PostgreSQL transaction.
///
/// sqlx rolls the inner transaction back when it is dropped without a
/// commit, which covers every error and cancellation path for free.
struct SqlTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for SqlTx {
    async fn create_transfer(&mut self, arg: CreateTransferParams) -> Result<Transfer, StoreError> {
        sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (from_account_id, to_account_id, amount_cents)
            VALUES ($1, $2, $3)
            RETURNING id, from_account_id, to_account_id, amount_cents, created_at
            "#,
        )
        .bind(arg.from_account_id)
        .bind(arg.to_account_id)
        .bind(arg.amount_cents)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_err)
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, StoreError> {
        sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (account_id, amount_cents)
            VALUES ($1, $2)
            RETURNING id, account_id, amount_cents, created_at
            "#,
        )
        .bind(arg.account_id)
        .bind(arg.amount_cents)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_err)
    }

    async fn add_account_balance(
        &mut self,
        account_id: i64,
        amount_cents: i64,
    ) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = balance + $1
            WHERE id = $2
            RETURNING id, owner, balance, currency, created_at
            "#,
        )
        .bind(amount_cents)
        .bind(account_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_err)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_db_err)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(map_db_err)
    }
}
