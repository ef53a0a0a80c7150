use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{errors, services::AppServices};
use crate::context::CallerContext;

/// Liveness probe.
pub async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// GET /api/me
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.accounts.get_account(caller.account_id()).await {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
