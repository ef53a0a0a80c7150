//! Domain error model.

use thiserror::Error;

/// Result type used across the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// The `Display` output of every variant is the user-visible message; the HTTP
/// boundary forwards it unchanged and only picks a status code from the variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller is not the owning account.
    #[error("{0}")]
    PermissionDenied(String),

    /// No seats left for the event.
    #[error("event is fully booked")]
    CapacityExceeded,

    /// The event has already taken place.
    #[error("cannot register for a past event")]
    Scheduling,

    /// The account already holds a registration for the event.
    #[error("you have already registered for this event")]
    DuplicateRegistration,

    /// Identity could not be established (bad credentials or token).
    #[error("{0}")]
    Unauthenticated(String),

    /// Store or other unclassified failure.
    #[error("{0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::PermissionDenied(_) => "permission_denied",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::Scheduling => "scheduling_error",
            Self::DuplicateRegistration => "duplicate_registration",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Internal(_) => "internal_error",
        }
    }
}
