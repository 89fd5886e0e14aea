use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use cerbero_auth::authorize_tenant_switch;

use crate::app::dto::{MyTenantsResponse, SwitchTenantRequest, SwitchTenantResponse};
use crate::app::errors::{json_error, store_error_to_response};
use crate::app::services::AppServices;
use crate::context::RequestSession;
use crate::default_route::get_default_route;

pub fn router() -> Router {
    Router::new()
        .route("/mine", get(mine))
        .route("/switch", post(switch))
}

pub async fn mine(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<RequestSession>,
) -> Result<Json<MyTenantsResponse>, Response> {
    let session = session.require()?;
    let memberships = services
        .rbac
        .memberships(session.user_id())
        .await
        .map_err(store_error_to_response)?;
    let is_super_admin = services
        .rbac
        .is_super_admin(session.user_id())
        .await
        .map_err(store_error_to_response)?;

    Ok(Json(MyTenantsResponse {
        active_tenant_id: session.active_tenant_id().cloned(),
        is_super_admin,
        memberships,
    }))
}

/// Change the session's active tenant.
///
/// Membership is checked against the store, not the session, so a revoked
/// membership cannot be re-entered with a stale session.
pub async fn switch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<RequestSession>,
    Json(req): Json<SwitchTenantRequest>,
) -> Result<Json<SwitchTenantResponse>, Response> {
    let session = session.require()?;
    let user_id = session.user_id();

    let memberships = services
        .rbac
        .memberships(user_id)
        .await
        .map_err(store_error_to_response)?;
    let is_super_admin = services
        .rbac
        .is_super_admin(user_id)
        .await
        .map_err(store_error_to_response)?;

    if let Err(e) = authorize_tenant_switch(&memberships, is_super_admin, req.tenant_id.as_ref()) {
        tracing::warn!(%user_id, target = ?req.tenant_id, error = %e, "tenant switch denied");
        return Err(json_error(StatusCode::FORBIDDEN, "tenant_switch_denied", e.to_string()));
    }

    if let Some(target) = &req.tenant_id {
        let exists = services
            .rbac
            .tenant(target)
            .await
            .map_err(store_error_to_response)?
            .is_some();
        if !exists {
            return Err(json_error(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("tenant '{target}' not found"),
            ));
        }
    }

    services
        .sessions
        .set_active_tenant(session.token(), req.tenant_id.clone())
        .await
        .map_err(store_error_to_response)?;

    let permissions = services
        .rbac
        .permissions_for(user_id, req.tenant_id.as_ref())
        .await
        .map_err(store_error_to_response)?;
    let redirect = get_default_route(services.table(), &permissions);

    tracing::info!(%user_id, target = ?req.tenant_id, redirect, "active tenant switched");
    Ok(Json(SwitchTenantResponse {
        active_tenant_id: req.tenant_id,
        redirect: redirect.to_string(),
    }))
}
