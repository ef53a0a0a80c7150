//! Account directory: sign-up, sign-in and account lookup.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use eventposter_auth::{
    Account, LoginRequest, LoginResponse, PasswordError, RegisterAccountRequest, Role,
    TokenIssuer, hash_password, verify_password,
};
use eventposter_core::{AccountId, DomainError, DomainResult};

use crate::repo::AccountRepository;

const INVALID_CREDENTIALS: &str = "invalid username or password";

#[derive(Clone)]
pub struct AccountDirectory {
    accounts: AccountRepository,
    tokens: Arc<dyn TokenIssuer>,
}

impl AccountDirectory {
    pub fn new(pool: SqlitePool, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            accounts: AccountRepository::new(pool),
            tokens,
        }
    }

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    pub async fn register(&self, request: &RegisterAccountRequest) -> DomainResult<AccountId> {
        request.validate()?;

        if self.accounts.username_taken(&request.username).await? {
            return Err(DomainError::validation("username already exists"));
        }
        if self.accounts.email_taken(&request.email).await? {
            return Err(DomainError::validation("email already exists"));
        }

        let password = request.password.clone();
        let hash = blocking(move || hash_password(&password)).await?;

        let account = Account {
            id: AccountId::new(),
            username: request.username.clone(),
            email: request.email.clone(),
            role: Role::USER,
            created_at: Utc::now(),
        };
        self.accounts.insert(&account, &hash).await?;

        info!(account_id = %account.id, "account registered");
        Ok(account.id)
    }

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    pub async fn login(&self, request: &LoginRequest) -> DomainResult<LoginResponse> {
        let Some((account, hash)) = self.accounts.find_credentials(&request.username).await? else {
            return Err(DomainError::unauthenticated(INVALID_CREDENTIALS));
        };

        let password = request.password.clone();
        let matches = match blocking(move || verify_password(&password, &hash)).await {
            Ok(matches) => matches,
            Err(err) => {
                warn!(account_id = %account.id, error = %err, "stored credential unusable");
                false
            }
        };
        if !matches {
            return Err(DomainError::unauthenticated(INVALID_CREDENTIALS));
        }

        let token = self
            .tokens
            .issue(&account, Utc::now())
            .map_err(|e| DomainError::internal(e.to_string()))?;

        info!(account_id = %account.id, "login succeeded");
        Ok(LoginResponse {
            token,
            user: account,
        })
    }

    pub async fn get_account(&self, id: AccountId) -> DomainResult<Account> {
        self.accounts
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user not found"))
    }
}

impl core::fmt::Debug for AccountDirectory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountDirectory")
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

/// Run a CPU-heavy password operation off the async workers.
async fn blocking<T, F>(op: F) -> DomainResult<T>
where
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| DomainError::internal(format!("password task failed: {e}")))?
        .map_err(|e| DomainError::internal(e.to_string()))
}
