use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::{Span, instrument};

use eventposter_booking::{Registration, RegistrationDetails};
use eventposter_core::time::{format_timestamp, parse_timestamp_or};
use eventposter_core::{AccountId, DomainError, EventId, RegistrationId};

use crate::db::{is_unique_violation, map_sqlx_error, parse_stored_id};

const DETAIL_COLUMNS: &str = r#"
    r.id, r.event_id, r.user_id, r.first_name, r.last_name, r.created_at,
    e.title AS event_title, e.description AS event_description,
    e.location AS event_location, e.event_date, e.event_type
"#;

/// Registration rows.
#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: SqlitePool,
}

impl RegistrationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count_for_event(&self, event_id: EventId) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = ?")
            .bind(event_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_registrations", e))
    }

    pub async fn exists_for_account(
        &self,
        event_id: EventId,
        account_id: AccountId,
    ) -> Result<bool, DomainError> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM registrations WHERE event_id = ? AND user_id = ? LIMIT 1",
        )
        .bind(event_id.to_string())
        .bind(account_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("check_existing_registration", e))?;
        Ok(found.is_some())
    }

    /// Insert `registration` only if its event still has a free seat.
    ///
    /// The seat count and the insert are one statement, so two writers cannot
    /// both take the last seat. Returns `false` when nothing was inserted
    /// (event full or gone). A second row for the same account surfaces as
    /// `DuplicateRegistration` through the unique index.
    #[instrument(
        skip(self, registration),
        fields(
            registration_id = %registration.id,
            event_id = %registration.event_id
        ),
        err
    )]
    pub async fn insert_if_seat_available(
        &self,
        registration: &Registration,
    ) -> Result<bool, DomainError> {
        let event_id = registration.event_id.to_string();
        let result = sqlx::query(
            r#"
            INSERT INTO registrations (id, event_id, user_id, first_name, last_name, created_at)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE (SELECT COUNT(*) FROM registrations WHERE event_id = ?)
                < (SELECT seats FROM events WHERE id = ?)
            "#,
        )
        .bind(registration.id.to_string())
        .bind(&event_id)
        .bind(registration.account_id.map(|id| id.to_string()))
        .bind(&registration.first_name)
        .bind(&registration.last_name)
        .bind(format_timestamp(registration.created_at))
        .bind(&event_id)
        .bind(&event_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::DuplicateRegistration
            } else {
                map_sqlx_error("insert_registration", e)
            }
        })?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find(&self, id: RegistrationId) -> Result<Option<Registration>, DomainError> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, event_id, user_id, first_name, last_name, created_at
            FROM registrations
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_registration", e))?;

        row.map(RegistrationRow::into_registration).transpose()
    }

    pub async fn find_details(
        &self,
        id: RegistrationId,
    ) -> Result<Option<RegistrationDetails>, DomainError> {
        let sql = format!(
            r#"
            SELECT {DETAIL_COLUMNS}
            FROM registrations r
            JOIN events e ON e.id = r.event_id
            WHERE r.id = ?
            "#
        );
        let row = sqlx::query_as::<_, DetailsRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_registration_details", e))?;

        row.map(DetailsRow::into_details).transpose()
    }

    /// Registrations (optionally for one event), oldest first.
    #[instrument(skip(self), fields(registration_count = tracing::field::Empty), err)]
    pub async fn list(&self, event_id: Option<EventId>) -> Result<Vec<Registration>, DomainError> {
        let event_id = event_id.map(|id| id.to_string());
        let rows = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, event_id, user_id, first_name, last_name, created_at
            FROM registrations
            WHERE (? IS NULL OR event_id = ?)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&event_id)
        .bind(&event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_registrations", e))?;

        Span::current().record("registration_count", rows.len());
        rows.into_iter().map(RegistrationRow::into_registration).collect()
    }

    /// An account's registrations with event details, newest first.
    pub async fn list_details_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<RegistrationDetails>, DomainError> {
        let sql = format!(
            r#"
            SELECT {DETAIL_COLUMNS}
            FROM registrations r
            JOIN events e ON e.id = r.event_id
            WHERE r.user_id = ?
            ORDER BY r.created_at DESC, r.id DESC
            "#
        );
        let rows = sqlx::query_as::<_, DetailsRow>(&sql)
            .bind(account_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_account_registrations", e))?;

        rows.into_iter().map(DetailsRow::into_details).collect()
    }

    /// Overwrite the registrant names in place.
    pub async fn rename(
        &self,
        id: RegistrationId,
        first_name: &str,
        last_name: &str,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE registrations SET first_name = ?, last_name = ? WHERE id = ?",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_registration", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Move a registration to `event_id` if that event has a free seat, with
    /// the same single-statement guarantee as [`Self::insert_if_seat_available`].
    #[instrument(skip(self, first_name, last_name), err)]
    pub async fn move_if_seat_available(
        &self,
        id: RegistrationId,
        event_id: EventId,
        first_name: &str,
        last_name: &str,
    ) -> Result<bool, DomainError> {
        let event_id = event_id.to_string();
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET event_id = ?, first_name = ?, last_name = ?
            WHERE id = ?
              AND (SELECT COUNT(*) FROM registrations WHERE event_id = ?)
                < (SELECT seats FROM events WHERE id = ?)
            "#,
        )
        .bind(&event_id)
        .bind(first_name)
        .bind(last_name)
        .bind(id.to_string())
        .bind(&event_id)
        .bind(&event_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::DuplicateRegistration
            } else {
                map_sqlx_error("move_registration", e)
            }
        })?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&self, id: RegistrationId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_registration", e))?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, FromRow)]
struct RegistrationRow {
    id: String,
    event_id: String,
    user_id: Option<String>,
    first_name: String,
    last_name: String,
    created_at: String,
}

impl RegistrationRow {
    fn into_registration(self) -> Result<Registration, DomainError> {
        let account_id = self
            .user_id
            .as_deref()
            .map(|raw| parse_stored_id(raw, "registrations.user_id"))
            .transpose()?;

        Ok(Registration {
            id: parse_stored_id(&self.id, "registrations.id")?,
            event_id: parse_stored_id(&self.event_id, "registrations.event_id")?,
            account_id,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: parse_timestamp_or(&self.created_at, Utc::now()),
        })
    }
}

#[derive(Debug, FromRow)]
struct DetailsRow {
    #[sqlx(flatten)]
    registration: RegistrationRow,
    event_title: String,
    event_description: Option<String>,
    event_location: Option<String>,
    event_date: String,
    event_type: String,
}

impl DetailsRow {
    fn into_details(self) -> Result<RegistrationDetails, DomainError> {
        Ok(RegistrationDetails {
            registration: self.registration.into_registration()?,
            event_title: self.event_title,
            event_description: self.event_description,
            event_location: self.event_location,
            event_date: eventposter_core::time::parse_timestamp(&self.event_date)?,
            event_type: self.event_type,
        })
    }
}
