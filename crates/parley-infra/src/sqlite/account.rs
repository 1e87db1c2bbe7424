//! SQLite account repository implementation.

use chrono::Utc;
use parley_core::repository::AccountRepository;
use parley_types::account::{Account, AccountId};
use parley_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, map_insert_error, parse_datetime, query_error};

/// SQLite-backed implementation of `AccountRepository`.
#[derive(Clone)]
pub struct SqliteAccountRepository {
    pool: DatabasePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Account.
pub(crate) struct AccountRow {
    id: String,
    handle: String,
    display_name: String,
    avatar_ref: Option<String>,
    created_at: String,
}

impl AccountRow {
    pub(crate) fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            handle: row.try_get("handle")?,
            display_name: row.try_get("display_name")?,
            avatar_ref: row.try_get("avatar_ref")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub(crate) fn into_account(self) -> Result<Account, RepositoryError> {
        let id = self
            .id
            .parse::<AccountId>()
            .map_err(|e| RepositoryError::Query(format!("invalid account id: {e}")))?;

        Ok(Account {
            id,
            handle: self.handle,
            display_name: self.display_name,
            avatar_ref: self.avatar_ref,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn map_account(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Account>, RepositoryError> {
    match row {
        Some(row) => {
            let account_row = AccountRow::from_row(&row).map_err(query_error)?;
            Ok(Some(account_row.into_account()?))
        }
        None => Ok(None),
    }
}

/// Insert an account row inside an open transaction or on a pool.
pub(crate) async fn insert_account<'e, E>(executor: E, account: &Account) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO accounts (id, handle, display_name, avatar_ref, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(account.id.to_string())
    .bind(&account.handle)
    .bind(&account.display_name)
    .bind(&account.avatar_ref)
    .bind(format_datetime(&account.created_at))
    .execute(executor)
    .await
    .map_err(|e| map_insert_error(e, || format!("handle '{}' already exists", account.handle)))?;
    Ok(())
}

impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: &Account) -> Result<Account, RepositoryError> {
        insert_account(&self.pool.writer, account).await?;
        Ok(account.clone())
    }

    async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        map_account(row)
    }

    async fn get_by_handle(&self, handle: &str) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE handle = ?")
            .bind(handle)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        map_account(row)
    }

    async fn add_token(&self, account_id: &AccountId, token_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO account_tokens (token_hash, account_id, created_at) VALUES (?, ?, ?)")
            .bind(token_hash)
            .bind(account_id.to_string())
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| map_insert_error(e, || "token already registered".to_string()))?;
        Ok(())
    }

    /// Also records the token's last use, best effort.
    async fn get_by_token_hash(&self, token_hash: &str) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query(
            "SELECT a.* FROM accounts a
             JOIN account_tokens t ON t.account_id = a.id
             WHERE t.token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let account = map_account(row)?;
        if account.is_some() {
            let _ = sqlx::query("UPDATE account_tokens SET last_used_at = ? WHERE token_hash = ?")
                .bind(format_datetime(&Utc::now()))
                .bind(token_hash)
                .execute(&self.pool.writer)
                .await;
        }
        Ok(account)
    }
}
