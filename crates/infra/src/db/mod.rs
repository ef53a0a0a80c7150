//! SQLite connection pool and error mapping.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `DomainError` in one place:
//!
//! | SQLx Error | DomainError | Scenario |
//! |------------|-------------|----------|
//! | Database (unique violation on `registrations(event_id, user_id)`) | `DuplicateRegistration` | Concurrent double registration (mapped at the call site) |
//! | Database (other) | `Internal` | Constraint or engine failure |
//! | PoolClosed | `Internal` | Connection pool was closed during shutdown |
//! | RowNotFound | `Internal` | Unexpected; queries use `fetch_optional` |
//! | Other | `Internal` | I/O, decode or configuration failures |

pub mod schema;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use eventposter_core::DomainError;

pub use schema::ensure_schema;

const FILE_POOL_SIZE: u32 = 5;

/// Open (creating if needed) the database at `database_url` and bootstrap the schema.
///
/// Foreign keys are enforced on every connection so that deleting an event
/// cascades to its registrations.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if is_in_memory(database_url) {
        // Each in-memory database lives exactly as long as its one connection.
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(FILE_POOL_SIZE)
            .connect_with(options.journal_mode(SqliteJournalMode::Wal))
            .await?
    };

    ensure_schema(&pool).await?;
    info!(database_url, "database ready");
    Ok(pool)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Map a SQLx error to a domain error, tagging it with the failed operation.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            DomainError::internal(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            DomainError::internal(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => {
            DomainError::internal(format!("unexpected row not found in {}", operation))
        }
        other => DomainError::internal(format!("database error in {}: {}", operation, other)),
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Parse an identifier read back from the store.
///
/// A malformed stored id is corruption, not bad input, so it is `Internal`.
pub(crate) fn parse_stored_id<T>(raw: &str, column: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse()
        .map_err(|_| DomainError::internal(format!("malformed stored {column}: '{raw}'")))
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:")
        .await
        .expect("in-memory database should open")
}
