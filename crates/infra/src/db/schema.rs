//! Schema bootstrap.
//!
//! Timestamps are TEXT in the canonical form from `eventposter_core::time`,
//! so `ORDER BY` and `<` on those columns are chronological.

use sqlx::SqlitePool;
use tracing::debug;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          TEXT PRIMARY KEY,
        username    TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL,
        email       TEXT NOT NULL UNIQUE,
        role        TEXT NOT NULL,
        created_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        description TEXT,
        location    TEXT,
        event_type  TEXT NOT NULL,
        event_date  TEXT NOT NULL,
        seats       INTEGER NOT NULL CHECK (seats > 0),
        creator_id  TEXT NOT NULL REFERENCES users(id),
        created_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_events_event_date ON events(event_date)",
    "CREATE INDEX IF NOT EXISTS idx_events_creator ON events(creator_id)",
    r#"
    CREATE TABLE IF NOT EXISTS registrations (
        id          TEXT PRIMARY KEY,
        event_id    TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
        user_id     TEXT REFERENCES users(id),
        first_name  TEXT NOT NULL,
        last_name   TEXT NOT NULL,
        created_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_registrations_event ON registrations(event_id)",
    "CREATE INDEX IF NOT EXISTS idx_registrations_user ON registrations(user_id)",
    // One registration per (event, account); anonymous rows are exempt.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ux_registrations_event_user
        ON registrations(event_id, user_id)
        WHERE user_id IS NOT NULL
    "#,
];

/// Create tables and indexes if they do not exist. Idempotent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(*statement).execute(pool).await?;
    }
    debug!(statements = STATEMENTS.len(), "schema verified");
    Ok(())
}
