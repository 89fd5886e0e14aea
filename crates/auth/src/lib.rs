//! `cerbero-auth` — pure authorization boundary.
//!
//! Permission catalog, resolution engine, role/tenant data model and the
//! canonical session shape. This crate is intentionally decoupled from HTTP
//! and storage: nothing here performs IO.

pub mod authorize;
pub mod catalog;
pub mod decision;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod tenant;

pub use authorize::{
    AccessExplanation, AuthzError, GrantKind, authorize, explain_access, has_all_permissions,
    has_any_permission, has_permission, has_resource_access, is_super_admin,
};
pub use catalog::PermissionDefinition;
pub use decision::{AccessDecision, AccessReason};
pub use permissions::{
    MODULAR_ACTION, ParsedPermission, Permission, PermissionParseError, SUPER_ADMIN,
    parse_permission,
};
pub use roles::{Role, RoleKey, RolePermissionSet, UserRole};
pub use session::{Session, SessionError, SessionInfo, SessionUser};
pub use tenant::{Tenant, TenantMembership, TenantSwitchError, authorize_tenant_switch};
