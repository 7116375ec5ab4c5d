//! PostgreSQL implementation of the account and token stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgQueryResult;
use sqlx::{FromRow, PgPool};

use crate::account::{
    Account, AccountError, AccountStore, NewAccount, Result, Role, ToInternal,
    Token, TokenService,
};
use crate::crypto::random_token;

/// Account record as stored in the database.
#[derive(Debug, Clone, FromRow)]
struct AccountRecord {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    role: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl AccountRecord {
    fn try_into_account(self) -> Result<Account> {
        Ok(Account {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            role: self.role.parse::<Role>().catch()?,
            password_hash: self.password,
            created_at: self.created_at,
        })
    }
}

/// Map unique index violations to [`AccountError::DuplicateAccount`].
fn on_insert(err: sqlx::Error) -> AccountError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            AccountError::DuplicateAccount
        },
        _ => AccountError::persistence(err),
    }
}

/// PostgreSQL account store.
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new [`PgAccountStore`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT id, first_name, last_name, email, role, password, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .catch()?;

        record.map(AccountRecord::try_into_account).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT id, first_name, last_name, email, role, password, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .catch()?;

        record.map(AccountRecord::try_into_account).transpose()
    }

    async fn save(&self, account: NewAccount) -> Result<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            INSERT INTO accounts (first_name, last_name, email, role, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, email, role, password, created_at
            "#,
        )
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(account.role.as_str())
        .bind(&account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(on_insert)?;

        record.try_into_account()
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let result: PgQueryResult = sqlx::query(
            r#"
            UPDATE accounts
            SET first_name = $2, last_name = $3, role = $4
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.role.as_str())
        .execute(&self.pool)
        .await
        .catch()?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound("account not found".into()));
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .catch()?;

        Ok(())
    }
}

/// PostgreSQL token store.
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    /// Create a new [`PgTokenStore`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenService for PgTokenStore {
    async fn issue_and_store(&self, account: &Account) -> Result<Token> {
        let value = random_token();

        sqlx::query(
            r#"
            INSERT INTO tokens (token, account_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(&value)
        .bind(account.id)
        .execute(&self.pool)
        .await
        .catch()?;

        Ok(Token {
            value,
            owner: account.id,
        })
    }

    async fn lookup(&self, account: &Account) -> Result<Option<Token>> {
        let record = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT token
            FROM tokens
            WHERE account_id = $1
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(account.id)
        .fetch_optional(&self.pool)
        .await
        .catch()?;

        Ok(record.map(|(value,)| Token {
            value,
            owner: account.id,
        }))
    }

    async fn resolve_account(&self, bearer: &str) -> Result<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT a.id, a.first_name, a.last_name, a.email, a.role, a.password, a.created_at
            FROM tokens t
            JOIN accounts a ON a.id = t.account_id
            WHERE t.token = $1
            "#,
        )
        .bind(bearer)
        .fetch_optional(&self.pool)
        .await
        .catch()?;

        match record {
            Some(record) => record.try_into_account(),
            None => {
                Err(AccountError::AuthenticationFailed("invalid token".into()))
            },
        }
    }
}
