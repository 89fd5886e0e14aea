use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::json;

use cerbero_auth::{Role, RolePermissionSet, Session, catalog, has_permission, is_super_admin};
use cerbero_core::{RoleId, TenantOwned};

use crate::app::dto::{ReplacePermissionsRequest, ResourcePermissions, RolePermissionsResponse};
use crate::app::errors::{json_error, json_response, store_error_to_response};
use crate::app::services::AppServices;
use crate::authz::require_permission;
use crate::context::RequestSession;

pub fn router() -> Router {
    Router::new()
        .route("/permissions", get(list_permissions))
        .route(
            "/roles/:role_id/permissions",
            get(role_permissions).put(replace_role_permissions),
        )
}

/// Assignable catalog grouped by resource.
pub async fn list_permissions(
    Extension(session): Extension<RequestSession>,
) -> Result<Json<Vec<ResourcePermissions>>, Response> {
    let session = session.require()?;
    require_permission(session, "roles:acceder")?;

    let grouped = catalog::resources()
        .into_iter()
        .map(|resource| ResourcePermissions {
            resource,
            permissions: catalog::by_resource(resource),
        })
        .collect();
    Ok(Json(grouped))
}

pub async fn role_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<RequestSession>,
    Path(role_id): Path<String>,
) -> Result<Json<RolePermissionsResponse>, Response> {
    let session = session.require()?;
    require_permission(session, "roles:acceder")?;

    let role = visible_role(&services, session, &role_id).await?;
    let set = services
        .rbac
        .role_permissions(&role.id)
        .await
        .map_err(store_error_to_response)?;
    Ok(Json(RolePermissionsResponse {
        role_id: role.id.to_string(),
        permissions: set.names(),
    }))
}

/// Replace a role's permission set wholesale.
///
/// Only tenant roles of the caller's active tenant are reachable (global
/// roles need a super-admin), and a non-super-admin can only grant what
/// their own held set already satisfies.
pub async fn replace_role_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<RequestSession>,
    Path(role_id): Path<String>,
    Json(req): Json<ReplacePermissionsRequest>,
) -> Result<Json<RolePermissionsResponse>, Response> {
    let session = session.require()?;
    require_permission(session, "roles:editar")?;

    let role = visible_role(&services, session, &role_id).await?;

    let set = RolePermissionSet::parse(&req.permissions)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "malformed_permission", e.to_string()))?;

    let held = session.held_permissions();
    if !is_super_admin(held) {
        let beyond: Vec<&str> = set
            .iter()
            .map(|p| p.as_str())
            .filter(|p| !has_permission(held, p))
            .collect();
        if !beyond.is_empty() {
            tracing::warn!(
                user_id = %session.user_id(),
                role_id = %role.id,
                ?beyond,
                "role grant exceeds caller's permissions"
            );
            return Err(json_response(
                StatusCode::FORBIDDEN,
                json!({
                    "error": "grant_exceeds_held",
                    "message": "cannot grant permissions you do not hold",
                    "permissions": beyond,
                }),
            ));
        }
    }
    services
        .rbac
        .replace_role_permissions(&role.id, &set)
        .await
        .map_err(store_error_to_response)?;

    tracing::info!(
        user_id = %session.user_id(),
        role_id = %role.id,
        count = set.len(),
        "role permissions replaced"
    );
    Ok(Json(RolePermissionsResponse {
        role_id: role.id.to_string(),
        permissions: set.names(),
    }))
}

/// Roles of other tenants, and global roles for non-super-admins, are
/// reported as missing rather than forbidden.
async fn visible_role(services: &AppServices, session: &Session, role_id: &str) -> Result<Role, Response> {
    let not_found = || json_error(StatusCode::NOT_FOUND, "not_found", format!("role '{role_id}' not found"));

    let role = services
        .rbac
        .role(&RoleId::from_raw(role_id))
        .await
        .map_err(store_error_to_response)?
        .ok_or_else(not_found)?;

    if is_super_admin(session.held_permissions()) {
        return Ok(role);
    }
    match session.active_tenant_id() {
        Some(active) if !role.is_global() && role.visible_from(active) => Ok(role),
        _ => Err(not_found()),
    }
}
