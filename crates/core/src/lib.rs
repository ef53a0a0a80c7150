//! `eventposter-core` — shared building blocks for the event-registration backend.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the error taxonomy, and the timestamp codec used
//! for persisted ISO-8601 values.

pub mod error;
pub mod id;
pub mod time;

pub use error::{DomainError, DomainResult};
pub use id::{AccountId, EventId, RegistrationId};
