use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use cerbero_infra::context::get_context;

use crate::context::RequestSession;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Caller identity plus the ambient context handlers actually run under.
pub async fn whoami(Extension(session): Extension<RequestSession>) -> impl IntoResponse {
    let ctx = get_context().unwrap_or_default();
    Json(serde_json::json!({
        "authenticated": session.get().is_some(),
        "userId": ctx.user_id,
        "tenantId": ctx.tenant_id,
        "permissions": session.get().map(|s| s.held_permissions()).unwrap_or_default(),
    }))
}
