//! Account-level errors.

pub type Result<T> = std::result::Result<T, AccountError>;

/// Errors that can occur while managing accounts.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("an account already exists with this email")]
    DuplicateAccount,
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("caller is not permitted to perform this operation")]
    NotPermitted,
    #[error("{0}")]
    NotFound(String),

    #[error("registration failed: {0}")]
    RegistrationFailed(String),
    #[error("update failed: {0}")]
    UpdateFailed(String),
    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("persistence failed: {0}")]
    PersistenceFailed(Box<dyn std::error::Error + Send + Sync>),
}

impl AccountError {
    pub fn persistence<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::PersistenceFailed(Box::new(err))
    }
}

/// Wrap foreign errors into [`AccountError::PersistenceFailed`].
pub trait ToInternal<T> {
    fn catch(self) -> Result<T>;
}

impl<T, E> ToInternal<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn catch(self) -> Result<T> {
        self.map_err(AccountError::persistence)
    }
}
