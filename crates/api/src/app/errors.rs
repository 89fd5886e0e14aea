use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use cerbero_infra::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::InvalidRecord => json_error(StatusCode::BAD_REQUEST, "invalid_record", err.to_string()),
        StoreError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", what),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::UnknownPermissions(names) => json_error(
            StatusCode::BAD_REQUEST,
            "unknown_permissions",
            format!("unknown permission(s): {}", names.join(", ")),
        ),
        StoreError::Domain(e) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", e.to_string()),
        StoreError::Permission(e) => json_error(StatusCode::BAD_REQUEST, "malformed_permission", e.to_string()),
        other => {
            tracing::error!(error = %other, "store failure");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", "storage is unavailable")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    json_response(
        status,
        json!({
            "error": code,
            "message": message.into(),
        }),
    )
}

pub fn json_response(status: StatusCode, body: serde_json::Value) -> axum::response::Response {
    (status, axum::Json(body)).into_response()
}
