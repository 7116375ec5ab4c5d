//! In-memory implementation of the account and token stores.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::account::{
    Account, AccountError, AccountStore, NewAccount, Result, Token,
    TokenService,
};
use crate::crypto::random_token;

#[derive(Default)]
struct AccountTable {
    last_id: i64,
    rows: HashMap<i64, Account>,
}

/// Shared tables handed out to both stores.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    accounts: Arc<RwLock<AccountTable>>,
    tokens: Arc<RwLock<HashMap<String, i64>>>,
}

impl MemoryDatabase {
    /// Create a new [`InMemoryAccountStore`] backed by this database.
    pub fn accounts(&self) -> InMemoryAccountStore {
        InMemoryAccountStore {
            accounts: Arc::clone(&self.accounts),
        }
    }

    /// Create a new [`InMemoryTokenStore`] backed by this database.
    pub fn tokens(&self) -> InMemoryTokenStore {
        InMemoryTokenStore {
            accounts: Arc::clone(&self.accounts),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<AccountTable>>,
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let table = self.accounts.read().await;
        Ok(table.rows.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.rows.get(&id).cloned())
    }

    async fn save(&self, account: NewAccount) -> Result<Account> {
        let mut table = self.accounts.write().await;

        // Same guarantee as the unique index on PostgreSQL.
        if table.rows.values().any(|a| a.email == account.email) {
            return Err(AccountError::DuplicateAccount);
        }

        table.last_id += 1;
        let account = Account {
            id: table.last_id,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            role: account.role,
            password_hash: account.password_hash,
            created_at: Utc::now(),
        };
        table.rows.insert(account.id, account.clone());

        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let mut table = self.accounts.write().await;

        let Some(row) = table.rows.get_mut(&account.id) else {
            return Err(AccountError::NotFound("account not found".into()));
        };
        row.first_name.clone_from(&account.first_name);
        row.last_name.clone_from(&account.last_name);
        row.role = account.role;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.accounts.write().await.rows.remove(&id);
        Ok(())
    }
}

pub struct InMemoryTokenStore {
    accounts: Arc<RwLock<AccountTable>>,
    tokens: Arc<RwLock<HashMap<String, i64>>>,
}

#[async_trait]
impl TokenService for InMemoryTokenStore {
    async fn issue_and_store(&self, account: &Account) -> Result<Token> {
        let value = random_token();
        self.tokens.write().await.insert(value.clone(), account.id);

        Ok(Token {
            value,
            owner: account.id,
        })
    }

    async fn lookup(&self, account: &Account) -> Result<Option<Token>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .iter()
            .find(|(_, owner)| **owner == account.id)
            .map(|(value, owner)| Token {
                value: value.clone(),
                owner: *owner,
            }))
    }

    async fn resolve_account(&self, bearer: &str) -> Result<Account> {
        let owner = self.tokens.read().await.get(bearer).copied();

        let account = match owner {
            Some(id) => self.accounts.read().await.rows.get(&id).cloned(),
            None => None,
        };

        account.ok_or_else(|| {
            AccountError::AuthenticationFailed("invalid token".into())
        })
    }
}
