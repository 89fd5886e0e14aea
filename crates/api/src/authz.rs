//! Use-case permission checks for API handlers.
//!
//! Route guards decide whether a *page* is reachable; handlers still check
//! the permission their operation needs before touching data.

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;

use cerbero_auth::{Session, authorize, has_any_permission};

use crate::app::errors::json_response;

/// Require `required` in the session's active tenant.
pub fn require_permission(session: &Session, required: &str) -> Result<(), Response> {
    authorize(session.held_permissions(), required).map_err(|e| {
        tracing::warn!(user_id = %session.user_id(), required, "operation forbidden");
        forbidden(&e.to_string(), &[required])
    })
}

/// Require at least one of `required`.
pub fn require_any_permission(session: &Session, required: &[&str]) -> Result<(), Response> {
    if has_any_permission(session.held_permissions(), required) {
        return Ok(());
    }
    tracing::warn!(user_id = %session.user_id(), ?required, "operation forbidden");
    Err(forbidden("forbidden: none of the required permissions is held", required))
}

fn forbidden(message: &str, required: &[&str]) -> Response {
    json_response(
        StatusCode::FORBIDDEN,
        json!({
            "error": "forbidden",
            "message": message,
            "requiredPermissions": required,
        }),
    )
}
