//! Registration ledger: admission-controlled registration writes.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use eventposter_auth::Identity;
use eventposter_booking::{
    AdmissionContext, Registration, RegistrantName, RegistrationDetails, RegistrationRequest,
    check_not_registered, check_schedule, check_seats, evaluate,
};
use eventposter_core::{AccountId, DomainError, DomainResult, EventId, RegistrationId};

use crate::repo::{EventRepository, RegistrationRepository};

#[derive(Debug, Clone)]
pub struct RegistrationLedger {
    events: EventRepository,
    registrations: RegistrationRepository,
}

impl RegistrationLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool),
        }
    }

    /// Registrations, optionally for one event, oldest first.
    pub async fn list_registrations(
        &self,
        event_id: Option<EventId>,
    ) -> DomainResult<Vec<Registration>> {
        self.registrations.list(event_id).await
    }

    /// An account's registrations with event details, newest first.
    pub async fn list_registrations_for_account(
        &self,
        account_id: AccountId,
    ) -> DomainResult<Vec<RegistrationDetails>> {
        self.registrations.list_details_for_account(account_id).await
    }

    pub async fn get_registration(&self, id: RegistrationId) -> DomainResult<RegistrationDetails> {
        self.registrations
            .find_details(id)
            .await?
            .ok_or_else(registration_not_found)
    }

    /// Admit a registration, or explain why not.
    ///
    /// Checks run in order and the first failure wins: request shape, event
    /// existence, free seats, schedule, duplicates (accounts only), names.
    /// The seat and duplicate conditions are enforced again by the insert
    /// itself, so concurrent callers cannot oversell.
    #[instrument(
        skip(self, request, registrant),
        fields(account_id = ?registrant.map(|i| i.account_id)),
        err
    )]
    pub async fn create_registration(
        &self,
        request: &RegistrationRequest,
        registrant: Option<&Identity>,
    ) -> DomainResult<RegistrationId> {
        let event_id = request.validate()?;
        let event = self.events.find(event_id).await?.ok_or_else(event_not_found)?;

        let now = Utc::now();
        let account_id = registrant.map(|identity| identity.account_id);
        let already_registered = match account_id {
            Some(account_id) => Some(
                self.registrations
                    .exists_for_account(event_id, account_id)
                    .await?,
            ),
            None => None,
        };
        let ctx = AdmissionContext {
            seats: event.seats,
            registrations: self.registrations.count_for_event(event_id).await?,
            event_date: event.event_date,
            already_registered,
        };
        evaluate(&ctx, now)?;

        let name = RegistrantName::for_new_registration(
            registrant.map(|identity| identity.display_name.as_str()),
            request,
        )?;
        let registration = Registration {
            id: RegistrationId::new(),
            event_id,
            account_id,
            first_name: name.first,
            last_name: name.last,
            created_at: now,
        };

        if !self.registrations.insert_if_seat_available(&registration).await? {
            return Err(self.classify_rejected_write(event_id).await);
        }

        info!(
            registration_id = %registration.id,
            event_id = %event_id,
            "registration created"
        );
        Ok(registration.id)
    }

    /// Edit a registration held by `caller`.
    ///
    /// Staying on the same event only rewrites names. Moving to another event
    /// is admitted like a new registration for that event.
    #[instrument(skip(self, request), err)]
    pub async fn update_registration(
        &self,
        id: RegistrationId,
        request: &RegistrationRequest,
        caller: AccountId,
    ) -> DomainResult<()> {
        let target = request.validate()?;

        let current = self
            .registrations
            .find(id)
            .await?
            .ok_or_else(registration_not_found)?;
        current.ensure_owned_by(caller, "update")?;

        let event = self.events.find(target).await?.ok_or_else(event_not_found)?;
        let name = RegistrantName::for_update(&current, request);

        let written = if target == current.event_id {
            self.registrations.rename(id, &name.first, &name.last).await?
        } else {
            let registrations = self.registrations.count_for_event(target).await?;
            check_seats(event.seats, registrations)?;
            check_schedule(event.event_date, Utc::now())?;
            check_not_registered(
                self.registrations
                    .exists_for_account(target, caller)
                    .await?,
            )?;

            debug!(from = %current.event_id, to = %target, "moving registration");
            if !self
                .registrations
                .move_if_seat_available(id, target, &name.first, &name.last)
                .await?
            {
                if self.registrations.find(id).await?.is_none() {
                    return Err(registration_not_found());
                }
                return Err(self.classify_rejected_write(target).await);
            }
            true
        };

        if !written {
            return Err(registration_not_found());
        }

        info!(registration_id = %id, event_id = %target, "registration updated");
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn delete_registration(
        &self,
        id: RegistrationId,
        caller: AccountId,
    ) -> DomainResult<()> {
        let current = self
            .registrations
            .find(id)
            .await?
            .ok_or_else(registration_not_found)?;
        current.ensure_owned_by(caller, "delete")?;

        if !self.registrations.delete(id).await? {
            return Err(registration_not_found());
        }

        info!(registration_id = %id, "registration deleted");
        Ok(())
    }

    /// Explain a conditional write that touched no row: the event was removed
    /// in the meantime, or its last seat was taken.
    async fn classify_rejected_write(&self, event_id: EventId) -> DomainError {
        match self.events.find(event_id).await {
            Ok(None) => event_not_found(),
            Ok(Some(_)) => DomainError::CapacityExceeded,
            Err(err) => err,
        }
    }
}

fn event_not_found() -> DomainError {
    DomainError::not_found("event not found")
}

fn registration_not_found() -> DomainError {
    DomainError::not_found("registration not found")
}
