//! Request/response bodies.

use serde::{Deserialize, Serialize};

use cerbero_auth::{PermissionDefinition, TenantMembership};
use cerbero_core::TenantId;

#[derive(Debug, Deserialize)]
pub struct AccessCheckRequest {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultRouteResponse {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub permission: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchTenantRequest {
    /// `null` leaves every tenant (super-admins only).
    pub tenant_id: Option<TenantId>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchTenantResponse {
    pub active_tenant_id: Option<TenantId>,
    pub redirect: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyTenantsResponse {
    pub active_tenant_id: Option<TenantId>,
    pub is_super_admin: bool,
    pub memberships: Vec<TenantMembership>,
}

#[derive(Debug, Serialize)]
pub struct ResourcePermissions {
    pub resource: &'static str,
    pub permissions: Vec<PermissionDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct ReplacePermissionsRequest {
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionsResponse {
    pub role_id: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVacancyRequest {
    pub titulo: String,
}
