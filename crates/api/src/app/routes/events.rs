use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use eventposter_booking::EventRequest;
use eventposter_core::EventId;

use super::parse_id;
use crate::app::{errors, services::AppServices};
use crate::context::CallerContext;

/// GET /api/events
pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list_events().await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /api/my-events
pub async fn list_my_events(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.catalog.list_events_by_owner(caller.account_id()).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /api/events/:id
pub async fn get_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EventId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.get_event(id).await {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /api/events
pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<EventRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };

    match services.catalog.create_event(&body, caller.account_id()).await {
        Ok(id) => (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// PUT /api/events/:id
pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<Json<EventRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: EventId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };

    match services
        .catalog
        .update_event(id, &body, caller.account_id())
        .await
    {
        Ok(()) => message(StatusCode::OK, "Event updated successfully"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// DELETE /api/events/:id
pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EventId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.delete_event(id, caller.account_id()).await {
        Ok(()) => message(StatusCode::OK, "Event deleted successfully"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub(crate) fn message(status: StatusCode, text: &str) -> axum::response::Response {
    (status, Json(serde_json::json!({ "message": text }))).into_response()
}
