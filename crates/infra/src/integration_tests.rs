//! End-to-end scenarios across catalog, ledger and sweeper.
//!
//! Verifies:
//! - Seat accounting stays exact through creates and deletes
//! - Concurrent registrations never oversell an event
//! - Deleting or expiring an event removes its registrations
//! - Listings survive rows that cannot be read back
//! - Capacity edits racing registrations end in a classified outcome

use std::sync::Arc;

use chrono::{Duration, Utc};

use eventposter_auth::{Identity, Role};
use eventposter_booking::{EventRequest, RegistrationRequest};
use eventposter_core::{AccountId, DomainError, EventId};

use crate::db::test_pool;
use crate::repo::AccountRepository;
use crate::test_support::seed_account;
use crate::{EventCatalog, ExpirySweeper, RegistrationLedger};

fn event_request(offset: Duration, seats: i64) -> EventRequest {
    EventRequest {
        title: "Borrow checker clinic".to_string(),
        description: None,
        location: None,
        event_type: "workshop".to_string(),
        event_date: Some(Utc::now() + offset),
        seats,
    }
}

async fn identities(accounts: &AccountRepository, n: usize) -> Vec<Identity> {
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let name = format!("guest{i}");
        let id = seed_account(accounts, &name).await;
        out.push(Identity::new(id, name, Role::USER));
    }
    out
}

#[tokio::test]
async fn available_seats_track_creates_and_deletes() {
    let pool = test_pool().await;
    let accounts = AccountRepository::new(pool.clone());
    let owner = seed_account(&accounts, "owner").await;
    let guests = identities(&accounts, 3).await;
    let catalog = EventCatalog::new(pool.clone());
    let ledger = RegistrationLedger::new(pool);

    let event_id = catalog
        .create_event(&event_request(Duration::days(1), 3), owner)
        .await
        .unwrap();

    let mut held = Vec::new();
    for guest in &guests {
        let id = ledger
            .create_registration(&RegistrationRequest::for_event(event_id), Some(guest))
            .await
            .unwrap();
        held.push((id, guest.account_id));
        let listing = catalog.get_event(event_id).await.unwrap();
        assert_eq!(listing.available_seats, 3 - held.len() as i64);
    }

    let (id, account) = held.remove(0);
    ledger.delete_registration(id, account).await.unwrap();
    let listing = catalog.get_event(event_id).await.unwrap();
    assert_eq!(listing.registrations, 2);
    assert_eq!(listing.available_seats, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_never_oversell() {
    let pool = test_pool().await;
    let accounts = AccountRepository::new(pool.clone());
    let owner = seed_account(&accounts, "owner").await;
    let guests = identities(&accounts, 10).await;
    let catalog = EventCatalog::new(pool.clone());
    let ledger = Arc::new(RegistrationLedger::new(pool));

    let event_id = catalog
        .create_event(&event_request(Duration::hours(2), 3), owner)
        .await
        .unwrap();

    let attempts: Vec<_> = guests
        .into_iter()
        .map(|guest| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .create_registration(&RegistrationRequest::for_event(event_id), Some(&guest))
                    .await
            })
        })
        .collect();

    let mut admitted = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(err) => assert_eq!(err, DomainError::CapacityExceeded),
        }
    }

    assert_eq!(admitted, 3);
    let listing = catalog.get_event(event_id).await.unwrap();
    assert_eq!(listing.registrations, 3);
    assert_eq!(listing.available_seats, 0);
}

#[tokio::test]
async fn deleting_event_removes_its_registrations() {
    let pool = test_pool().await;
    let accounts = AccountRepository::new(pool.clone());
    let owner = seed_account(&accounts, "owner").await;
    let guests = identities(&accounts, 2).await;
    let catalog = EventCatalog::new(pool.clone());
    let ledger = RegistrationLedger::new(pool);

    let event_id = catalog
        .create_event(&event_request(Duration::days(1), 5), owner)
        .await
        .unwrap();
    for guest in &guests {
        ledger
            .create_registration(&RegistrationRequest::for_event(event_id), Some(guest))
            .await
            .unwrap();
    }

    catalog.delete_event(event_id, owner).await.unwrap();
    assert!(ledger.list_registrations(Some(event_id)).await.unwrap().is_empty());
    assert!(
        ledger
            .list_registrations_for_account(guests[0].account_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn sweep_keeps_future_event_and_its_registrations() {
    let pool = test_pool().await;
    let accounts = AccountRepository::new(pool.clone());
    let owner = seed_account(&accounts, "owner").await;
    let guests = identities(&accounts, 1).await;
    let catalog = EventCatalog::new(pool.clone());
    let ledger = RegistrationLedger::new(pool.clone());
    let sweeper = ExpirySweeper::new(crate::repo::EventRepository::new(pool));

    // Created within the one-day tolerance, so it is already in the past.
    let past = catalog
        .create_event(&event_request(-Duration::seconds(1), 5), owner)
        .await
        .unwrap();
    let future = catalog
        .create_event(&event_request(Duration::hours(1), 5), owner)
        .await
        .unwrap();
    ledger
        .create_registration(&RegistrationRequest::for_event(future), Some(&guests[0]))
        .await
        .unwrap();

    assert_eq!(sweeper.sweep_expired_events().await.unwrap(), 1);
    assert_eq!(
        catalog.get_event(past).await,
        Err(DomainError::not_found("event not found"))
    );
    let kept = catalog.get_event(future).await.unwrap();
    assert_eq!(kept.registrations, 1);
}

#[tokio::test]
async fn owner_and_registrant_views_are_separate() {
    let pool = test_pool().await;
    let accounts = AccountRepository::new(pool.clone());
    let owner = seed_account(&accounts, "owner").await;
    let stranger = AccountId::new();
    let catalog = EventCatalog::new(pool.clone());

    catalog
        .create_event(&event_request(Duration::days(1), 5), owner)
        .await
        .unwrap();
    assert_eq!(catalog.list_events_by_owner(owner).await.unwrap().len(), 1);
    assert!(catalog.list_events_by_owner(stranger).await.unwrap().is_empty());
    assert!(catalog.get_event(EventId::new()).await.is_err());
}

#[tokio::test]
async fn five_digit_years_never_reach_the_store() {
    let pool = test_pool().await;
    let owner = seed_account(&AccountRepository::new(pool.clone()), "owner").await;
    let catalog = EventCatalog::new(pool);

    let normal = catalog
        .create_event(&event_request(Duration::days(1), 5), owner)
        .await
        .unwrap();
    let far_future: EventRequest = serde_json::from_value(serde_json::json!({
        "title": "Y10K party",
        "event_type": "party",
        "event_date": "+10000-01-01T00:00:00Z",
        "seats": 5,
    }))
    .unwrap();

    assert_eq!(
        catalog.create_event(&far_future, owner).await,
        Err(DomainError::validation("event date is out of range"))
    );
    assert_eq!(
        catalog.update_event(normal, &far_future, owner).await,
        Err(DomainError::validation("event date is out of range"))
    );

    assert_eq!(catalog.list_events().await.unwrap().len(), 1);
    catalog.get_event(normal).await.unwrap();
    catalog.delete_event(normal, owner).await.unwrap();
}

#[tokio::test]
async fn unreadable_rows_do_not_break_listings() {
    let pool = test_pool().await;
    let owner = seed_account(&AccountRepository::new(pool.clone()), "owner").await;
    let catalog = EventCatalog::new(pool.clone());

    let readable = catalog
        .create_event(&event_request(Duration::days(1), 5), owner)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO events (id, title, event_type, event_date, seats, creator_id) VALUES ('broken', 't', 'x', '1999-garbage', 1, ?)",
    )
    .bind(owner.to_string())
    .execute(&pool)
    .await
    .unwrap();

    // The sweep skips the row; the listing must still answer.
    let listed = catalog.list_events().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].event.id, readable);

    let mine = catalog.list_events_by_owner(owner).await.unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn capacity_edits_racing_registrations_stay_classified() {
    let pool = test_pool().await;
    let accounts = AccountRepository::new(pool.clone());
    let owner = seed_account(&accounts, "owner").await;
    let guests = identities(&accounts, 2).await;
    let catalog = Arc::new(EventCatalog::new(pool.clone()));
    let ledger = Arc::new(RegistrationLedger::new(pool));

    let event_id = catalog
        .create_event(&event_request(Duration::days(1), 3), owner)
        .await
        .unwrap();

    let churn: Vec<_> = guests
        .into_iter()
        .map(|guest| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                for _ in 0..25 {
                    let request = RegistrationRequest::for_event(event_id);
                    match ledger.create_registration(&request, Some(&guest)).await {
                        Ok(id) => ledger.delete_registration(id, guest.account_id).await.unwrap(),
                        Err(err) => assert_eq!(err, DomainError::CapacityExceeded),
                    }
                }
            })
        })
        .collect();

    let edits = {
        let catalog = catalog.clone();
        tokio::spawn(async move {
            for round in 0..50 {
                let seats = if round % 2 == 0 { 1 } else { 3 };
                match catalog
                    .update_event(event_id, &event_request(Duration::days(1), seats), owner)
                    .await
                {
                    Ok(()) => {}
                    Err(err) => assert!(
                        matches!(err, DomainError::Validation(_)),
                        "unexpected update error: {err:?}"
                    ),
                }
            }
        })
    };

    for task in churn {
        task.await.unwrap();
    }
    edits.await.unwrap();

    let listing = catalog.get_event(event_id).await.unwrap();
    assert_eq!(listing.registrations, 0);
}
