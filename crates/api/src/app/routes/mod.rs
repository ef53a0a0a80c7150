use std::str::FromStr;

use axum::{
    routing::{get, post},
    Router,
};

use eventposter_core::DomainError;

use crate::app::errors;

pub mod accounts;
pub mod events;
pub mod registrations;
pub mod system;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/events", get(events::list_events))
        .route("/events/:id", get(events::get_event))
}

/// Routes that require an authenticated caller.
pub fn protected_router() -> Router {
    Router::new()
        .route("/me", get(system::me))
        .route("/my-events", get(events::list_my_events))
        .route("/my-registrations", get(registrations::list_my_registrations))
        .route("/events", post(events::create_event))
        .route(
            "/events/:id",
            axum::routing::put(events::update_event).delete(events::delete_event),
        )
        .route(
            "/registrations",
            get(registrations::list_registrations).post(registrations::create_registration),
        )
        .route(
            "/registrations/:id",
            get(registrations::get_registration)
                .put(registrations::update_registration)
                .delete(registrations::delete_registration),
        )
}

/// Parse a path or query identifier; failures become a 400 response.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}
