//! These traits define what the account service needs from the outside world.

use async_trait::async_trait;

use crate::account::{Account, NewAccount, Result, Token};

/// Port for account persistence operations.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find an account by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Find an account by identifier.
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>>;

    /// Insert a new account and return it with its assigned identifier.
    async fn save(&self, account: NewAccount) -> Result<Account>;

    /// Overwrite mutable fields of an existing account.
    async fn update(&self, account: &Account) -> Result<()>;

    /// Remove account `id`. Removing a missing account is not an error.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Port for bearer token issuance and lookup.
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Mint a token for `account` and store it.
    async fn issue_and_store(&self, account: &Account) -> Result<Token>;

    /// Find the token previously issued to `account`.
    async fn lookup(&self, account: &Account) -> Result<Option<Token>>;

    /// Find the account owning `bearer`.
    ///
    /// Fails with [`crate::account::AccountError::AuthenticationFailed`]
    /// when the token is unknown.
    async fn resolve_account(&self, bearer: &str) -> Result<Account>;
}

/// Port for outbound notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a message to `recipient`.
    async fn send(&self, recipient: &str, subject: &str, body: &str)
    -> Result<()>;
}

/// Port for password hashing operations.
pub trait CredentialHasher: Send + Sync {
    /// Derive the stored form of `password`.
    fn hash(&self, password: &str) -> Result<String>;

    /// Check `password` against a stored hash.
    ///
    /// `Ok(false)` means the password does not match. `Err` means the hash
    /// could not be computed or parsed.
    fn verify(&self, password: &str, stored: &str) -> Result<bool>;
}
