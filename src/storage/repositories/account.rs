//! Account and profile repository.
//!
//! Accounts are keyed by their normalized email. Reset tokens are stored as a
//! digest plus expiry on the account row, and consumed with a single
//! conditional UPDATE so concurrent consumers cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{instrument, Instrument};

use crate::auth::account::{Account, AccountCredentials, NewAccount, Profile};
use crate::domain::AccountId;
use crate::errors::{Error, Result};
use crate::storage::DbPool;

// Database row structures

#[derive(Debug, Clone, FromRow)]
struct AccountRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile_account_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

impl From<AccountRow> for AccountCredentials {
    fn from(row: AccountRow) -> Self {
        let profile = row.profile_account_id.map(|_| Profile {
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number,
        });

        AccountCredentials {
            account: Account {
                id: AccountId::from_string(row.id),
                email: row.email,
                enabled: row.enabled,
                profile,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
            reset_token_hash: row.reset_token_hash,
            reset_token_expires_at: row.reset_token_expires_at,
        }
    }
}

const SELECT_ACCOUNT: &str = r#"
    SELECT a.id, a.email, a.password_hash, a.enabled, a.reset_token_hash,
           a.reset_token_expires_at, a.created_at, a.updated_at,
           p.account_id AS profile_account_id, p.first_name, p.last_name, p.phone_number
    FROM accounts a
    LEFT JOIN profiles p ON p.account_id = a.id
"#;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert an account and its optional profile in one transaction.
    /// A duplicate email is a `Conflict`.
    async fn create_account(&self, account: NewAccount) -> Result<Account>;

    /// Look up an account and its secrets by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountCredentials>>;

    /// Look up the account currently holding the given reset-token digest
    async fn find_by_reset_token_hash(&self, token_hash: &str)
        -> Result<Option<AccountCredentials>>;

    /// Store a reset-token digest and expiry, replacing any previous one
    async fn store_reset_token(
        &self,
        id: &AccountId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Set a new password digest and clear the reset fields, but only if the
    /// account still holds `token_hash`. Returns whether the row was updated.
    async fn consume_reset_token(
        &self,
        id: &AccountId,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<bool>;

    /// Enable or disable an account. Returns false when no account matched.
    async fn set_enabled(&self, email: &str, enabled: bool) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct SqlxAccountRepository {
    pool: DbPool,
}

impl SqlxAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<AccountCredentials>> {
        let query = format!("{} WHERE a.{} = ?", SELECT_ACCOUNT, column);
        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(crate::db_span!("fetch_account", column = %column))
            .await
            .map_err(|err| Error::database(err, format!("Failed to fetch account by {}", column)))?;

        Ok(row.map(AccountCredentials::from))
    }
}

#[async_trait]
impl AccountRepository for SqlxAccountRepository {
    #[instrument(skip(self, account), fields(account_id = %account.id), name = "db_create_account")]
    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| Error::database(err, "Failed to begin account transaction"))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO accounts (id, email, password_hash, enabled, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            let error = Error::database(err, "Failed to create account");
            if error.is_unique_violation() {
                return Err(Error::conflict("Email already in use", "account"));
            }
            return Err(error);
        }

        if let Some(profile) = &account.profile {
            sqlx::query(
                r#"
                INSERT INTO profiles (account_id, first_name, last_name, phone_number)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&account.id)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.phone_number)
            .execute(&mut *tx)
            .await
            .map_err(|err| Error::database(err, "Failed to create profile"))?;
        }

        tx.commit().await.map_err(|err| Error::database(err, "Failed to commit account"))?;

        Ok(Account {
            id: account.id,
            email: account.email,
            enabled: true,
            profile: account.profile,
            created_at: now,
            updated_at: now,
        })
    }

    #[instrument(skip(self), name = "db_find_account_by_email")]
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountCredentials>> {
        self.fetch_one_by("email", email).await
    }

    #[instrument(skip(self, token_hash), name = "db_find_account_by_reset_token")]
    async fn find_by_reset_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<AccountCredentials>> {
        self.fetch_one_by("reset_token_hash", token_hash).await
    }

    #[instrument(skip(self, token_hash), fields(account_id = %id), name = "db_store_reset_token")]
    async fn store_reset_token(
        &self,
        id: &AccountId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET reset_token_hash = ?, reset_token_expires_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(token_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to store reset token"))?;

        Ok(())
    }

    #[instrument(skip(self, token_hash, password_hash), fields(account_id = %id), name = "db_consume_reset_token")]
    async fn consume_reset_token(
        &self,
        id: &AccountId,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = ?, reset_token_hash = NULL, reset_token_expires_at = NULL,
                updated_at = ?
            WHERE id = ? AND reset_token_hash = ?
            "#,
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to consume reset token"))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), name = "db_set_account_enabled")]
    async fn set_enabled(&self, email: &str, enabled: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE accounts SET enabled = ?, updated_at = ? WHERE email = ?")
                .bind(enabled)
                .bind(Utc::now())
                .bind(email)
                .execute(&self.pool)
                .await
                .map_err(|err| Error::database(err, "Failed to update account status"))?;

        Ok(result.rows_affected() == 1)
    }
}
