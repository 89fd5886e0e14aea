//! Vacancies: a tenant-owned resource served through the scoped data client.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::{Value, json};

use cerbero_infra::scoping::{EntityKind, Query, TENANT_FIELD};

use crate::app::dto::CreateVacancyRequest;
use crate::app::errors::{json_error, store_error_to_response};
use crate::app::services::AppServices;
use crate::authz::require_permission;
use crate::context::RequestSession;

pub fn router() -> Router {
    Router::new().route("/", get(list).post(create))
}

/// Lists the active tenant's vacancies; the interceptor adds the tenant filter.
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<RequestSession>,
) -> Result<Json<Vec<Value>>, Response> {
    let session = session.require()?;
    require_permission(session, "vacantes:acceder")?;

    let rows = services
        .data
        .find_many(EntityKind::Vacancy, Query::all())
        .await
        .map_err(store_error_to_response)?;
    Ok(Json(rows))
}

/// Writes are not intercepted, so the owning tenant is set here explicitly.
pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<RequestSession>,
    Json(req): Json<CreateVacancyRequest>,
) -> Result<(StatusCode, Json<Value>), Response> {
    let session = session.require()?;
    require_permission(session, "vacantes:crear")?;

    let Some(tenant_id) = session.active_tenant_id() else {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "no_active_tenant",
            "select a tenant before creating vacancies",
        ));
    };
    if req.titulo.trim().is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "validation", "titulo must not be empty"));
    }

    let mut record = json!({
        "titulo": req.titulo,
        "createdBy": session.user_id(),
    });
    record[TENANT_FIELD] = json!(tenant_id);

    let created = services
        .data
        .create(EntityKind::Vacancy, record)
        .await
        .map_err(store_error_to_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}
