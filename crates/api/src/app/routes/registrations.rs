use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use eventposter_booking::RegistrationRequest;
use eventposter_core::{EventId, RegistrationId};

use super::{events::message, parse_id};
use crate::app::{errors, services::AppServices};
use crate::context::CallerContext;

#[derive(Debug, Default, Deserialize)]
pub struct RegistrationFilter {
    #[serde(default)]
    pub event_id: Option<String>,
}

/// GET /api/registrations[?event_id=]
pub async fn list_registrations(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<RegistrationFilter>, QueryRejection>,
) -> axum::response::Response {
    let Query(filter) = match query {
        Ok(q) => q,
        Err(rej) => return errors::query_rejection(rej),
    };

    // An empty `event_id=` means no filter.
    let event_id = match filter.event_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match parse_id::<EventId>(raw) {
            Ok(id) => Some(id),
            Err(resp) => return resp,
        },
    };

    match services.ledger.list_registrations(event_id).await {
        Ok(registrations) => (StatusCode::OK, Json(registrations)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /api/my-registrations
pub async fn list_my_registrations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services
        .ledger
        .list_registrations_for_account(caller.account_id())
        .await
    {
        Ok(registrations) => (StatusCode::OK, Json(registrations)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /api/registrations/:id
pub async fn get_registration(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RegistrationId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.get_registration(id).await {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /api/registrations
pub async fn create_registration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<RegistrationRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };

    match services
        .ledger
        .create_registration(&body, Some(caller.identity()))
        .await
    {
        Ok(id) => (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// PUT /api/registrations/:id
pub async fn update_registration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<Json<RegistrationRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: RegistrationId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };

    match services
        .ledger
        .update_registration(id, &body, caller.account_id())
        .await
    {
        Ok(()) => message(StatusCode::OK, "Registration updated successfully"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// DELETE /api/registrations/:id
pub async fn delete_registration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RegistrationId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .ledger
        .delete_registration(id, caller.account_id())
        .await
    {
        Ok(()) => message(StatusCode::OK, "Registration deleted successfully"),
        Err(e) => errors::domain_error_to_response(e),
    }
}
