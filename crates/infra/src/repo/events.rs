use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{Span, instrument, warn};

use eventposter_booking::{Event, EventListing};
use eventposter_core::time::{format_timestamp, parse_timestamp, parse_timestamp_or};
use eventposter_core::{AccountId, DomainError, EventId};

use crate::db::{map_sqlx_error, parse_stored_id};

const LISTING_COLUMNS: &str = r#"
    e.id, e.title, e.description, e.location, e.event_type, e.event_date,
    e.seats, e.creator_id, e.created_at,
    COUNT(r.id) AS registrations
"#;

/// Event rows with their live registration counts.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

/// An event whose stored date sorts before the sweep instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryCandidate {
    pub id: String,
    pub title: String,
    pub event_date: String,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, event), fields(event_id = %event.id), err)]
    pub async fn insert(&self, event: &Event) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO events (
                id, title, description, location, event_type,
                event_date, seats, creator_id, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(&event.event_type)
        .bind(format_timestamp(event.event_date))
        .bind(event.seats)
        .bind(event.creator_id.to_string())
        .bind(format_timestamp(event.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_event", e))?;
        Ok(())
    }

    pub async fn find(&self, id: EventId) -> Result<Option<Event>, DomainError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, title, description, location, event_type, event_date,
                   seats, creator_id, created_at
            FROM events
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_event", e))?;

        row.map(EventRow::into_event).transpose()
    }

    pub async fn find_listing(&self, id: EventId) -> Result<Option<EventListing>, DomainError> {
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM events e
            LEFT JOIN registrations r ON r.event_id = e.id
            WHERE e.id = ?
            GROUP BY e.id
            "#
        );
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_event_listing", e))?;

        row.map(ListingRow::into_listing).transpose()
    }

    /// All events (or only `owner`'s), soonest first.
    ///
    /// Rows whose stored fields cannot be read back are logged and left out.
    #[instrument(skip(self), fields(event_count = tracing::field::Empty), err)]
    pub async fn list_listings(
        &self,
        owner: Option<AccountId>,
    ) -> Result<Vec<EventListing>, DomainError> {
        let owner = owner.map(|id| id.to_string());
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM events e
            LEFT JOIN registrations r ON r.event_id = e.id
            WHERE (? IS NULL OR e.creator_id = ?)
            GROUP BY e.id
            ORDER BY e.event_date ASC, e.id ASC
            "#
        );
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(&owner)
            .bind(&owner)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_events", e))?;

        // One unreadable row must not hide the rest of the catalog.
        let listings: Vec<EventListing> = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.event.id.clone();
                row.into_listing()
                    .map_err(|err| {
                        warn!(event_id = %id, error = %err, "skipping unreadable event");
                    })
                    .ok()
            })
            .collect();

        Span::current().record("event_count", listings.len());
        Ok(listings)
    }

    /// Overwrite the mutable fields of `event`, provided the new capacity still
    /// covers the registrations held at the moment of the write.
    ///
    /// Returns `false` when no row was written (event gone or capacity too low).
    #[instrument(skip(self, event), fields(event_id = %event.id), err)]
    pub async fn update_if_capacity_covers(&self, event: &Event) -> Result<bool, DomainError> {
        let id = event.id.to_string();
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = ?, description = ?, location = ?, event_type = ?,
                event_date = ?, seats = ?
            WHERE id = ?
              AND (SELECT COUNT(*) FROM registrations WHERE event_id = ?) <= ?
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(&event.event_type)
        .bind(format_timestamp(event.event_date))
        .bind(event.seats)
        .bind(&id)
        .bind(&id)
        .bind(event.seats)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_event", e))?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete an event; registrations go with it via `ON DELETE CASCADE`.
    pub async fn delete(&self, id: EventId) -> Result<bool, DomainError> {
        self.delete_raw(&id.to_string()).await
    }

    pub(crate) async fn delete_raw(&self, id: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Events whose stored date sorts strictly before `now`.
    ///
    /// Dates are returned raw; the sweeper re-parses each one before deleting.
    pub async fn expiry_candidates(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpiryCandidate>, DomainError> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT id, title, event_date FROM events WHERE event_date < ? ORDER BY event_date",
        )
        .bind(format_timestamp(now))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("select_expired_events", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, title, event_date)| ExpiryCandidate {
                id,
                title,
                event_date,
            })
            .collect())
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: Option<String>,
    location: Option<String>,
    event_type: String,
    event_date: String,
    seats: i64,
    creator_id: String,
    created_at: String,
}

impl EventRow {
    fn into_event(self) -> Result<Event, DomainError> {
        Ok(Event {
            id: parse_stored_id(&self.id, "events.id")?,
            title: self.title,
            description: self.description,
            location: self.location,
            event_type: self.event_type,
            event_date: parse_timestamp(&self.event_date)?,
            seats: self.seats,
            creator_id: parse_stored_id(&self.creator_id, "events.creator_id")?,
            created_at: parse_timestamp_or(&self.created_at, Utc::now()),
        })
    }
}

#[derive(Debug, FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    event: EventRow,
    registrations: i64,
}

impl ListingRow {
    fn into_listing(self) -> Result<EventListing, DomainError> {
        Ok(EventListing::new(self.event.into_event()?, self.registrations))
    }
}
