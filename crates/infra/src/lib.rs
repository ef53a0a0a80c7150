//! Infrastructure layer: SQLite store, services and background workers.
//!
//! Services own the store handle they are constructed with; there is no
//! global connection. Each service method takes the caller identity it needs
//! as an explicit argument.

pub mod catalog;
pub mod db;
pub mod directory;
pub mod ledger;
pub mod repo;
pub mod workers;

pub use catalog::EventCatalog;
pub use directory::AccountDirectory;
pub use ledger::RegistrationLedger;
pub use workers::ExpirySweeper;

#[cfg(test)]
mod integration_tests;
