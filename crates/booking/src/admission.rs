//! Admission control: may a registration attempt proceed?
//!
//! The checks are pure; the store gathers an [`AdmissionContext`] snapshot and
//! repeats the seat and duplicate conditions inside its conditional insert so
//! a concurrent writer cannot slip past them.

use chrono::{DateTime, Utc};

use eventposter_core::{DomainError, DomainResult};

use crate::event::available_seats;

/// Snapshot of the facts an admission decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionContext {
    pub seats: i64,
    pub registrations: i64,
    pub event_date: DateTime<Utc>,
    /// `None` for anonymous registrants.
    pub already_registered: Option<bool>,
}

pub fn check_seats(seats: i64, registrations: i64) -> DomainResult<()> {
    if available_seats(seats, registrations) <= 0 {
        return Err(DomainError::CapacityExceeded);
    }
    Ok(())
}

pub fn check_schedule(event_date: DateTime<Utc>, now: DateTime<Utc>) -> DomainResult<()> {
    if event_date < now {
        return Err(DomainError::Scheduling);
    }
    Ok(())
}

pub fn check_not_registered(already_registered: bool) -> DomainResult<()> {
    if already_registered {
        return Err(DomainError::DuplicateRegistration);
    }
    Ok(())
}

/// Run the admission checks in order: seats, schedule, duplicates.
pub fn evaluate(ctx: &AdmissionContext, now: DateTime<Utc>) -> DomainResult<()> {
    check_seats(ctx.seats, ctx.registrations)?;
    check_schedule(ctx.event_date, now)?;
    if let Some(already) = ctx.already_registered {
        check_not_registered(already)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn ctx(seats: i64, registrations: i64, event_date: DateTime<Utc>) -> AdmissionContext {
        AdmissionContext {
            seats,
            registrations,
            event_date,
            already_registered: Some(false),
        }
    }

    #[test]
    fn open_future_event_admits() {
        let now = Utc::now();
        assert_eq!(evaluate(&ctx(1, 0, now + Duration::hours(1)), now), Ok(()));
    }

    #[test]
    fn full_event_is_rejected() {
        let now = Utc::now();
        assert_eq!(
            evaluate(&ctx(1, 1, now + Duration::hours(1)), now),
            Err(DomainError::CapacityExceeded)
        );
    }

    #[test]
    fn capacity_is_checked_before_schedule() {
        let now = Utc::now();
        assert_eq!(
            evaluate(&ctx(2, 2, now - Duration::hours(1)), now),
            Err(DomainError::CapacityExceeded)
        );
    }

    #[test]
    fn past_event_is_rejected_regardless_of_capacity() {
        let now = Utc::now();
        assert_eq!(
            evaluate(&ctx(500, 0, now - Duration::seconds(1)), now),
            Err(DomainError::Scheduling)
        );
    }

    #[test]
    fn duplicate_is_checked_last() {
        let now = Utc::now();
        let mut c = ctx(10, 1, now + Duration::hours(1));
        c.already_registered = Some(true);
        assert_eq!(evaluate(&c, now), Err(DomainError::DuplicateRegistration));

        c.already_registered = None;
        assert_eq!(evaluate(&c, now), Ok(()));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: replaying an arbitrary sequence of register/cancel attempts
        /// through the seat check never admits more than the capacity, and the
        /// available seats always equal capacity minus admitted registrations.
        #[test]
        fn admitted_never_exceeds_capacity(
            seats in 1i64..20,
            ops in prop::collection::vec(any::<bool>(), 0..80)
        ) {
            let mut admitted = 0i64;
            for register in ops {
                if register {
                    match check_seats(seats, admitted) {
                        Ok(()) => admitted += 1,
                        Err(e) => {
                            prop_assert_eq!(e, DomainError::CapacityExceeded);
                            prop_assert_eq!(admitted, seats);
                        }
                    }
                } else if admitted > 0 {
                    admitted -= 1;
                }

                prop_assert!(admitted <= seats);
                prop_assert_eq!(available_seats(seats, admitted), seats - admitted);
                prop_assert!(available_seats(seats, admitted) >= 0);
            }
        }
    }
}
