//! Account manager.

use crate::account::policy::{can_manage_any, can_manage_target};
use crate::account::{
    Account, AccountError, AccountStore, CreateAccountRequest,
    CredentialHasher, NewAccount, Notifier, ProfileUpdate, ResponseStatus,
    Result, Role, SignInRequest, SignInResponse, SignUpRequest,
    StatusResponse, TokenService, USER_CREATED, USER_UPDATED,
};

const WELCOME_SUBJECT: &str = "Welcome to the store";
const WELCOME_BODY: &str = "Thank you for signing up on our site.";

/// Account service: registration, sign-in, privileged creation and updates.
pub struct AccountService {
    store: Box<dyn AccountStore>,
    tokens: Box<dyn TokenService>,
    notifier: Box<dyn Notifier>,
    hasher: Box<dyn CredentialHasher>,
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(
        store: Box<dyn AccountStore>,
        tokens: Box<dyn TokenService>,
        notifier: Box<dyn Notifier>,
        hasher: Box<dyn CredentialHasher>,
    ) -> Self {
        Self {
            store,
            tokens,
            notifier,
            hasher,
        }
    }

    /// Register a new account with the `user` role.
    pub async fn register(
        &self,
        request: SignUpRequest,
    ) -> Result<StatusResponse> {
        let SignUpRequest {
            first_name,
            last_name,
            email,
            password,
        } = request;

        self.create_account(first_name, last_name, email, Role::User, password)
            .await
    }

    /// Check credentials and return the token issued at registration.
    pub async fn sign_in(
        &self,
        request: SignInRequest,
    ) -> Result<SignInResponse> {
        let Some(account) = self
            .store
            .find_by_email(&request.email)
            .await
            .map_err(operation_failed)?
        else {
            metrics::counter!("sign_in_total", "outcome" => "unknown_account")
                .increment(1);
            return Err(AccountError::AuthenticationFailed(
                "account not found".into(),
            ));
        };

        let matches = self
            .hasher
            .verify(&request.password, &account.password_hash)
            .inspect_err(|err| {
                tracing::error!(%err, account_id = account.id, "hashing password failed");
            })?;

        if !matches {
            metrics::counter!("sign_in_total", "outcome" => "wrong_credential")
                .increment(1);
            tracing::debug!(account_id = account.id, "wrong credential");
            return Err(AccountError::AuthenticationFailed(
                "wrong credential".into(),
            ));
        }

        let token = self
            .tokens
            .lookup(&account)
            .await
            .map_err(operation_failed)?
            .ok_or_else(|| {
                AccountError::OperationFailed("token not present".into())
            })?;

        metrics::counter!("sign_in_total", "outcome" => "success").increment(1);
        tracing::info!(account_id = account.id, "sign-in successful");

        Ok(SignInResponse {
            status: ResponseStatus::Success,
            token: token.value,
        })
    }

    /// Create an account with an explicit role on behalf of an admin.
    pub async fn create_privileged(
        &self,
        caller_token: &str,
        request: CreateAccountRequest,
    ) -> Result<StatusResponse> {
        let caller = self.resolve_caller(caller_token).await?;

        if !can_manage_any(caller.role) {
            tracing::warn!(
                caller_id = caller.id,
                caller_role = %caller.role,
                "account creation refused"
            );
            return Err(AccountError::NotPermitted);
        }

        let CreateAccountRequest {
            first_name,
            last_name,
            email,
            role,
            password,
        } = request;

        self.create_account(first_name, last_name, email, role, password)
            .await
    }

    /// Overwrite names and role of account `id`.
    ///
    /// No authorization is checked here. Callers exposed to end users go
    /// through [`AccountService::update_profile_as`].
    pub async fn update_profile(
        &self,
        id: i64,
        update: ProfileUpdate,
    ) -> Result<StatusResponse> {
        let mut account = self.find_account(id).await?;

        account.first_name = update.first_name;
        account.last_name = update.last_name;
        account.role = update.role;

        self.store.update(&account).await.map_err(|err| match err {
            AccountError::PersistenceFailed(err) => {
                AccountError::UpdateFailed(err.to_string())
            },
            other => other,
        })?;

        tracing::info!(account_id = id, role = %account.role, "account updated");

        Ok(StatusResponse::success(USER_UPDATED))
    }

    /// Update account `id` on behalf of the owner of `caller_token`.
    ///
    /// Admins may update anyone, including roles. Users may only update
    /// their own names and never their role.
    pub async fn update_profile_as(
        &self,
        caller_token: &str,
        id: i64,
        update: ProfileUpdate,
    ) -> Result<StatusResponse> {
        let caller = self.resolve_caller(caller_token).await?;

        if !can_manage_target(&caller, id) {
            tracing::warn!(caller_id = caller.id, target_id = id, "update refused");
            return Err(AccountError::NotPermitted);
        }

        if !can_manage_any(caller.role) && update.role != caller.role {
            tracing::warn!(caller_id = caller.id, role = %update.role, "self role change refused");
            return Err(AccountError::NotPermitted);
        }

        self.update_profile(id, update).await
    }

    /// Find account `id`.
    pub async fn account(&self, id: i64) -> Result<Account> {
        self.find_account(id).await
    }

    /// Find account `id` on behalf of the owner of `caller_token`.
    pub async fn account_as(
        &self,
        caller_token: &str,
        id: i64,
    ) -> Result<Account> {
        let caller = self.resolve_caller(caller_token).await?;

        if !can_manage_target(&caller, id) {
            return Err(AccountError::NotPermitted);
        }

        self.find_account(id).await
    }

    async fn find_account(&self, id: i64) -> Result<Account> {
        self.store
            .find_by_id(id)
            .await
            .map_err(operation_failed)?
            .ok_or_else(|| AccountError::NotFound("account not found".into()))
    }

    async fn resolve_caller(&self, token: &str) -> Result<Account> {
        self.tokens
            .resolve_account(token)
            .await
            .map_err(operation_failed)
    }

    async fn create_account(
        &self,
        first_name: String,
        last_name: String,
        email: String,
        role: Role,
        password: String,
    ) -> Result<StatusResponse> {
        if self
            .store
            .find_by_email(&email)
            .await
            .map_err(registration_failed)?
            .is_some()
        {
            return Err(AccountError::DuplicateAccount);
        }

        let password_hash = self.hasher.hash(&password).inspect_err(|err| {
            tracing::error!(%err, "hashing password failed");
        })?;

        let account = self
            .store
            .save(NewAccount {
                first_name,
                last_name,
                email,
                role,
                password_hash,
            })
            .await
            .map_err(registration_failed)?;

        // An account without a token can never sign in, so undo the insert.
        if let Err(err) = self.tokens.issue_and_store(&account).await {
            tracing::error!(%err, account_id = account.id, "token issuance failed");
            if let Err(err) = self.store.delete(account.id).await {
                tracing::error!(%err, account_id = account.id, "rollback of account failed");
            }
            return Err(registration_failed(err));
        }

        // Best effort: the account exists whatever the notifier says.
        if let Err(err) = self
            .notifier
            .send(&account.email, WELCOME_SUBJECT, WELCOME_BODY)
            .await
        {
            tracing::warn!(%err, account_id = account.id, "welcome notification not sent");
        }

        metrics::counter!("accounts_created_total", "role" => account.role.as_str())
            .increment(1);
        tracing::info!(account_id = account.id, role = %account.role, "account created");

        Ok(StatusResponse::success(USER_CREATED))
    }
}

fn registration_failed(err: AccountError) -> AccountError {
    match err {
        AccountError::PersistenceFailed(err) => {
            AccountError::RegistrationFailed(err.to_string())
        },
        other => other,
    }
}

fn operation_failed(err: AccountError) -> AccountError {
    match err {
        AccountError::PersistenceFailed(err) => {
            AccountError::OperationFailed(err.to_string())
        },
        other => other,
    }
}
