//! Events and their seat accounting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use eventposter_core::time::is_storable;
use eventposter_core::{AccountId, DomainError, DomainResult, EventId};

/// How far in the past a new or edited event may be scheduled.
pub const PAST_DATE_TOLERANCE_HOURS: i64 = 24;

/// A scheduled event with finite seating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_type: String,
    pub event_date: DateTime<Utc>,
    pub seats: i64,
    pub creator_id: AccountId,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_owned_by(&self, account_id: AccountId) -> bool {
        self.creator_id == account_id
    }

    /// Reject `caller` unless it created this event. `action` names the
    /// attempted operation in the error message ("update", "delete").
    pub fn ensure_owned_by(&self, caller: AccountId, action: &str) -> DomainResult<()> {
        if self.is_owned_by(caller) {
            return Ok(());
        }
        Err(DomainError::permission_denied(format!(
            "you don't have permission to {action} this event"
        )))
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.event_date < now
    }
}

/// Create/update payload for an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seats: i64,
}

impl EventRequest {
    /// Validate the request and return the scheduled date.
    ///
    /// Checks run in a fixed order and the first failure wins.
    pub fn validate(&self, now: DateTime<Utc>) -> DomainResult<DateTime<Utc>> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        if self.event_type.trim().is_empty() {
            return Err(DomainError::validation("event type is required"));
        }

        let Some(event_date) = self.event_date else {
            return Err(DomainError::validation("event date is required"));
        };
        if event_date < now - Duration::hours(PAST_DATE_TOLERANCE_HOURS) {
            return Err(DomainError::validation(
                "event date must be no more than one day in the past",
            ));
        }
        if !is_storable(event_date) {
            return Err(DomainError::validation("event date is out of range"));
        }

        if self.seats <= 0 {
            return Err(DomainError::validation(
                "number of seats must be greater than zero",
            ));
        }

        Ok(event_date)
    }
}

/// An event together with its live seat usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventListing {
    #[serde(flatten)]
    pub event: Event,
    pub registrations: i64,
    pub available_seats: i64,
}

impl EventListing {
    pub fn new(event: Event, registrations: i64) -> Self {
        let available_seats = available_seats(event.seats, registrations);
        Self {
            event,
            registrations,
            available_seats,
        }
    }
}

/// Seats still open: capacity minus current registrations.
pub fn available_seats(seats: i64, registrations: i64) -> i64 {
    seats - registrations
}

/// A capacity edit may not drop below the registrations already taken.
pub fn check_capacity_covers(new_seats: i64, registrations: i64) -> DomainResult<()> {
    if new_seats < registrations {
        return Err(DomainError::validation(
            "cannot reduce seats below the number of existing registrations",
        ));
    }
    Ok(())
}
