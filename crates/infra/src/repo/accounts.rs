use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

use eventposter_auth::{Account, Role};
use eventposter_core::time::{format_timestamp, parse_timestamp_or};
use eventposter_core::{AccountId, DomainError};

use crate::db::{is_unique_violation, map_sqlx_error, parse_stored_id};

/// Account rows. The credential hash is only ever handed out alongside the
/// account for verification and is never part of [`Account`].
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool, DomainError> {
        self.exists("SELECT 1 FROM users WHERE username = ? LIMIT 1", username)
            .await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool, DomainError> {
        self.exists("SELECT 1 FROM users WHERE email = ? LIMIT 1", email)
            .await
    }

    async fn exists(&self, sql: &str, value: &str) -> Result<bool, DomainError> {
        let found: Option<i64> = sqlx::query_scalar(sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("check_user_exists", e))?;
        Ok(found.is_some())
    }

    /// Persist a new account with its credential hash.
    ///
    /// A concurrent sign-up that wins the race on username or email surfaces
    /// here as a unique violation and is reported like the pre-check would.
    #[instrument(skip(self, account, password_hash), fields(account_id = %account.id), err)]
    pub async fn insert(&self, account: &Account, password_hash: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password, email, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.username)
        .bind(password_hash)
        .bind(&account.email)
        .bind(account.role.as_str())
        .bind(format_timestamp(account.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                let message = e.to_string();
                if message.contains("users.email") {
                    DomainError::validation("email already exists")
                } else {
                    DomainError::validation("username already exists")
                }
            } else {
                map_sqlx_error("insert_user", e)
            }
        })?;
        Ok(())
    }

    pub async fn find(&self, id: AccountId) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, username, password, email, role, created_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;

        row.map(|r| r.into_account().map(|(account, _)| account))
            .transpose()
    }

    /// Look up an account and its credential hash by username.
    pub async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(Account, String)>, DomainError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, username, password, email, role, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_credentials", e))?;

        row.map(AccountRow::into_account).transpose()
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: String,
    username: String,
    password: String,
    email: String,
    role: String,
    created_at: String,
}

impl AccountRow {
    fn into_account(self) -> Result<(Account, String), DomainError> {
        let account = Account {
            id: parse_stored_id(&self.id, "users.id")?,
            username: self.username,
            email: self.email,
            role: Role::new(self.role),
            created_at: parse_timestamp_or(&self.created_at, Utc::now()),
        };
        Ok((account, self.password))
    }
}
