use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use larder_auth::{AuthError, DirectoryError};

use crate::sessions::SessionError;

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

/// Every token problem looks the same to clients.
pub fn unauthenticated() -> axum::response::Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
}

pub fn forbidden() -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden")
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}

pub fn bad_request(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

fn internal_error() -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
}

pub fn auth_error_to_response(err: &AuthError) -> axum::response::Response {
    match StatusCode::from_u16(err.status_code()) {
        Ok(StatusCode::UNAUTHORIZED) => unauthenticated(),
        Ok(StatusCode::FORBIDDEN) => forbidden(),
        _ => internal_error(),
    }
}

pub fn session_error_to_response(err: &SessionError) -> axum::response::Response {
    tracing::error!(error = %err, "session store call failed");
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "service_unavailable",
        "session store unavailable",
    )
}

pub fn directory_error_to_response(err: &DirectoryError) -> axum::response::Response {
    match err {
        DirectoryError::Unavailable(_) => {
            tracing::error!(error = %err, "user directory call failed");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "user directory unavailable",
            )
        }
        DirectoryError::Duplicate(username) => {
            bad_request(format!("user with name {username} already exists"))
        }
        DirectoryError::Invalid(reason) => bad_request(reason.clone()),
    }
}
