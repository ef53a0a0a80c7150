//! SQLite repositories.
//!
//! Repositories translate rows to domain values and nothing more; business
//! rules live in the services that compose them.

pub mod accounts;
pub mod events;
pub mod registrations;

pub use accounts::AccountRepository;
pub use events::{EventRepository, ExpiryCandidate};
pub use registrations::RegistrationRepository;
