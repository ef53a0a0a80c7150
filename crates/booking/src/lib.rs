//! Booking domain: events, registrations and admission control.
//!
//! This crate contains the business rules for seat accounting, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). The
//! caller supplies the clock and the live registration counts.

pub mod admission;
pub mod event;
pub mod registration;

pub use admission::{
    AdmissionContext, check_not_registered, check_schedule, check_seats, evaluate,
};
pub use event::{
    Event, EventListing, EventRequest, PAST_DATE_TOLERANCE_HOURS, available_seats,
    check_capacity_covers,
};
pub use registration::{Registration, RegistrantName, RegistrationDetails, RegistrationRequest};
