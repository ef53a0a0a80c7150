//! Event catalog: event CRUD with ownership checks.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};

use eventposter_booking::{Event, EventListing, EventRequest, check_capacity_covers};
use eventposter_core::{AccountId, DomainError, DomainResult, EventId};

use crate::ExpirySweeper;
use crate::repo::{EventRepository, RegistrationRepository};

/// Conditional writes tried before an update is reported as conflicting.
const UPDATE_ATTEMPTS: u32 = 2;

const UPDATE_CONFLICT: &str = "event registrations changed during the update, please retry";

#[derive(Debug, Clone)]
pub struct EventCatalog {
    events: EventRepository,
    registrations: RegistrationRepository,
    sweeper: ExpirySweeper,
}

impl EventCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        let events = EventRepository::new(pool.clone());
        Self {
            sweeper: ExpirySweeper::new(events.clone()),
            events,
            registrations: RegistrationRepository::new(pool),
        }
    }

    /// All events, soonest first. Past events are swept out beforehand.
    pub async fn list_events(&self) -> DomainResult<Vec<EventListing>> {
        self.sweep_before_listing().await;
        self.events.list_listings(None).await
    }

    /// Events created by `owner`, soonest first.
    pub async fn list_events_by_owner(&self, owner: AccountId) -> DomainResult<Vec<EventListing>> {
        self.sweep_before_listing().await;
        self.events.list_listings(Some(owner)).await
    }

    async fn sweep_before_listing(&self) {
        if let Err(err) = self.sweeper.sweep_expired_events().await {
            warn!(error = %err, "expiry sweep before listing failed");
        }
    }

    pub async fn get_event(&self, id: EventId) -> DomainResult<EventListing> {
        self.events
            .find_listing(id)
            .await?
            .ok_or_else(event_not_found)
    }

    #[instrument(skip(self, request), fields(owner = %owner), err)]
    pub async fn create_event(
        &self,
        request: &EventRequest,
        owner: AccountId,
    ) -> DomainResult<EventId> {
        let now = Utc::now();
        let event_date = request.validate(now)?;

        let event = Event {
            id: EventId::new(),
            title: request.title.clone(),
            description: request.description.clone(),
            location: request.location.clone(),
            event_type: request.event_type.clone(),
            event_date,
            seats: request.seats,
            creator_id: owner,
            created_at: now,
        };
        self.events.insert(&event).await?;

        info!(event_id = %event.id, title = %event.title, "event created");
        Ok(event.id)
    }

    #[instrument(skip(self, request), fields(caller = %caller), err)]
    pub async fn update_event(
        &self,
        id: EventId,
        request: &EventRequest,
        caller: AccountId,
    ) -> DomainResult<()> {
        let event_date = request.validate(Utc::now())?;

        let current = self.events.find(id).await?.ok_or_else(event_not_found)?;
        current.ensure_owned_by(caller, "update")?;

        let registrations = self.registrations.count_for_event(id).await?;
        check_capacity_covers(request.seats, registrations)?;

        let updated = Event {
            title: request.title.clone(),
            description: request.description.clone(),
            location: request.location.clone(),
            event_type: request.event_type.clone(),
            event_date,
            seats: request.seats,
            ..current
        };

        for attempt in 1..=UPDATE_ATTEMPTS {
            if self.events.update_if_capacity_covers(&updated).await? {
                info!(event_id = %id, "event updated");
                return Ok(());
            }

            // Lost a race: the event vanished or took registrations meanwhile.
            if self.events.find(id).await?.is_none() {
                return Err(event_not_found());
            }
            let registrations = self.registrations.count_for_event(id).await?;
            check_capacity_covers(request.seats, registrations)?;
            debug!(event_id = %id, attempt, "event changed during update");
        }

        Err(DomainError::validation(UPDATE_CONFLICT))
    }

    #[instrument(skip(self), err)]
    pub async fn delete_event(&self, id: EventId, caller: AccountId) -> DomainResult<()> {
        let current = self.events.find(id).await?.ok_or_else(event_not_found)?;
        current.ensure_owned_by(caller, "delete")?;

        if !self.events.delete(id).await? {
            return Err(event_not_found());
        }

        info!(event_id = %id, "event deleted");
        Ok(())
    }
}

fn event_not_found() -> DomainError {
    DomainError::not_found("event not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::db::test_pool;
    use crate::repo::AccountRepository;
    use crate::test_support::{sample_event, sample_registration, seed_account};

    struct Fixture {
        catalog: EventCatalog,
        events: EventRepository,
        registrations: RegistrationRepository,
        owner: AccountId,
        other: AccountId,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;
        let accounts = AccountRepository::new(pool.clone());
        let owner = seed_account(&accounts, "owner").await;
        let other = seed_account(&accounts, "other").await;
        Fixture {
            catalog: EventCatalog::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool),
            owner,
            other,
        }
    }

    fn request(seats: i64) -> EventRequest {
        EventRequest {
            title: "Rust meetup".to_string(),
            description: None,
            location: Some("Berlin".to_string()),
            event_type: "meetup".to_string(),
            event_date: Some(Utc::now() + Duration::days(2)),
            seats,
        }
    }

    #[tokio::test]
    async fn created_event_is_readable_with_full_availability() {
        let f = fixture().await;
        let id = f.catalog.create_event(&request(10), f.owner).await.unwrap();

        let listing = f.catalog.get_event(id).await.unwrap();
        assert_eq!(listing.event.creator_id, f.owner);
        assert_eq!(listing.registrations, 0);
        assert_eq!(listing.available_seats, 10);
    }

    #[tokio::test]
    async fn create_rejects_date_a_day_and_a_half_ago() {
        let f = fixture().await;
        let mut req = request(10);
        req.event_date = Some(Utc::now() - Duration::hours(36));
        assert_eq!(
            f.catalog.create_event(&req, f.owner).await,
            Err(DomainError::validation(
                "event date must be no more than one day in the past"
            ))
        );
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let f = fixture().await;
        assert_eq!(
            f.catalog.get_event(EventId::new()).await,
            Err(DomainError::not_found("event not found"))
        );
        assert_eq!(
            f.catalog.delete_event(EventId::new(), f.owner).await,
            Err(DomainError::not_found("event not found"))
        );
    }

    #[tokio::test]
    async fn only_owner_may_update_or_delete() {
        let f = fixture().await;
        let id = f.catalog.create_event(&request(10), f.owner).await.unwrap();

        assert_eq!(
            f.catalog.update_event(id, &request(20), f.other).await,
            Err(DomainError::permission_denied(
                "you don't have permission to update this event"
            ))
        );
        assert_eq!(
            f.catalog.delete_event(id, f.other).await,
            Err(DomainError::permission_denied(
                "you don't have permission to delete this event"
            ))
        );

        let mut edit = request(20);
        edit.title = "Rust meetup (moved)".to_string();
        f.catalog.update_event(id, &edit, f.owner).await.unwrap();
        let listing = f.catalog.get_event(id).await.unwrap();
        assert_eq!(listing.event.title, "Rust meetup (moved)");
        assert_eq!(listing.event.seats, 20);

        f.catalog.delete_event(id, f.owner).await.unwrap();
        assert!(f.catalog.get_event(id).await.is_err());
    }

    #[tokio::test]
    async fn capacity_cannot_drop_below_registrations() {
        let f = fixture().await;
        let id = f.catalog.create_event(&request(3), f.owner).await.unwrap();
        for _ in 0..2 {
            f.registrations
                .insert_if_seat_available(&sample_registration(id, None))
                .await
                .unwrap();
        }

        assert_eq!(
            f.catalog.update_event(id, &request(1), f.owner).await,
            Err(DomainError::validation(
                "cannot reduce seats below the number of existing registrations"
            ))
        );
        assert_eq!(f.catalog.get_event(id).await.unwrap().event.seats, 3);

        f.catalog.update_event(id, &request(2), f.owner).await.unwrap();
        assert_eq!(f.catalog.get_event(id).await.unwrap().available_seats, 0);
    }

    #[tokio::test]
    async fn listing_sweeps_past_events_first() {
        let f = fixture().await;
        let past = sample_event(f.owner, Utc::now() - Duration::minutes(5), 5);
        f.events.insert(&past).await.unwrap();
        let upcoming = f.catalog.create_event(&request(5), f.owner).await.unwrap();

        let listed: Vec<EventId> = f
            .catalog
            .list_events()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.event.id)
            .collect();
        assert_eq!(listed, vec![upcoming]);
        assert!(f.events.find(past.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn owner_listing_is_filtered() {
        let f = fixture().await;
        let mine = f.catalog.create_event(&request(5), f.owner).await.unwrap();
        f.catalog.create_event(&request(5), f.other).await.unwrap();

        let listed = f.catalog.list_events_by_owner(f.owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].event.id, mine);
        assert_eq!(f.catalog.list_events().await.unwrap().len(), 2);
    }
}
