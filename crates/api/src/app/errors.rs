use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use eventposter_core::DomainError;

/// Map a domain error to its HTTP response, keeping the message verbatim.
///
/// Internal failures are logged here and reported without detail.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        DomainError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::CapacityExceeded | DomainError::DuplicateRegistration => StatusCode::CONFLICT,
        DomainError::Scheduling => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Internal(detail) => {
            error!(error = %detail, "request failed");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.code(),
                "internal server error",
            );
        }
    };

    json_error(status, err.code(), err.to_string())
}

pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (DomainError::validation("title is required"), StatusCode::BAD_REQUEST),
            (DomainError::unauthenticated("nope"), StatusCode::UNAUTHORIZED),
            (DomainError::permission_denied("nope"), StatusCode::FORBIDDEN),
            (DomainError::not_found("event not found"), StatusCode::NOT_FOUND),
            (DomainError::CapacityExceeded, StatusCode::CONFLICT),
            (DomainError::DuplicateRegistration, StatusCode::CONFLICT),
            (DomainError::Scheduling, StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::internal("disk on fire"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }
}
