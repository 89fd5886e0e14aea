//! RBAC and session storage.
//!
//! Sessions are issued by an external mechanism; [`SessionStore`] is the
//! narrow view of it this crate needs (lookup + active-tenant mutation).

use std::sync::Arc;

use async_trait::async_trait;

use cerbero_auth::{Role, RolePermissionSet, SUPER_ADMIN, Session, Tenant, TenantMembership, UserRole};
use cerbero_core::{RoleId, TenantId, UserId};

use crate::error::StoreError;

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::{InMemoryRbacStore, InMemorySessionStore};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresRbacStore, PostgresSessionStore};

#[async_trait]
pub trait RbacStore: Send + Sync {
    async fn upsert_tenant(&self, tenant: Tenant) -> Result<(), StoreError>;

    async fn tenant(&self, tenant_id: &TenantId) -> Result<Option<Tenant>, StoreError>;

    /// Insert or rename a role. Fails with `Conflict` when another role holds
    /// the same uniqueness key.
    async fn upsert_role(&self, role: Role) -> Result<(), StoreError>;

    async fn role(&self, role_id: &RoleId) -> Result<Option<Role>, StoreError>;

    async fn assign_role(&self, assignment: UserRole) -> Result<(), StoreError>;

    /// Atomically replace a role's permission set (delete-all-then-insert).
    ///
    /// Readers observe either the old set or the new one, never a mix.
    async fn replace_role_permissions(
        &self,
        role_id: &RoleId,
        permissions: &RolePermissionSet,
    ) -> Result<(), StoreError>;

    async fn role_permissions(&self, role_id: &RoleId) -> Result<RolePermissionSet, StoreError>;

    /// Tenants the user holds at least one role in.
    async fn memberships(&self, user_id: &UserId) -> Result<Vec<TenantMembership>, StoreError>;

    /// Effective permission names of `user_id` inside `tenant_id`, sorted.
    ///
    /// Always includes permissions granted through global assignments.
    async fn permissions_for(
        &self,
        user_id: &UserId,
        tenant_id: Option<&TenantId>,
    ) -> Result<Vec<String>, StoreError>;

    async fn is_super_admin(&self, user_id: &UserId) -> Result<bool, StoreError> {
        let global = self.permissions_for(user_id, None).await?;
        Ok(global.iter().any(|p| p == SUPER_ADMIN))
    }
}

/// A stored session as issued upstream.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: UserId,
    pub active_tenant_id: Option<TenantId>,
}

impl core::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("active_tenant_id", &self.active_tenant_id)
            .finish()
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// The only tenant-switch mutation. Callers authorize first.
    async fn set_active_tenant(&self, token: &str, tenant_id: Option<TenantId>) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> RbacStore for Arc<S>
where
    S: RbacStore + ?Sized,
{
    async fn upsert_tenant(&self, tenant: Tenant) -> Result<(), StoreError> {
        (**self).upsert_tenant(tenant).await
    }

    async fn tenant(&self, tenant_id: &TenantId) -> Result<Option<Tenant>, StoreError> {
        (**self).tenant(tenant_id).await
    }

    async fn upsert_role(&self, role: Role) -> Result<(), StoreError> {
        (**self).upsert_role(role).await
    }

    async fn role(&self, role_id: &RoleId) -> Result<Option<Role>, StoreError> {
        (**self).role(role_id).await
    }

    async fn assign_role(&self, assignment: UserRole) -> Result<(), StoreError> {
        (**self).assign_role(assignment).await
    }

    async fn replace_role_permissions(
        &self,
        role_id: &RoleId,
        permissions: &RolePermissionSet,
    ) -> Result<(), StoreError> {
        (**self).replace_role_permissions(role_id, permissions).await
    }

    async fn role_permissions(&self, role_id: &RoleId) -> Result<RolePermissionSet, StoreError> {
        (**self).role_permissions(role_id).await
    }

    async fn memberships(&self, user_id: &UserId) -> Result<Vec<TenantMembership>, StoreError> {
        (**self).memberships(user_id).await
    }

    async fn permissions_for(
        &self,
        user_id: &UserId,
        tenant_id: Option<&TenantId>,
    ) -> Result<Vec<String>, StoreError> {
        (**self).permissions_for(user_id, tenant_id).await
    }

    async fn is_super_admin(&self, user_id: &UserId) -> Result<bool, StoreError> {
        (**self).is_super_admin(user_id).await
    }
}

#[async_trait]
impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        (**self).lookup(token).await
    }

    async fn set_active_tenant(&self, token: &str, tenant_id: Option<TenantId>) -> Result<(), StoreError> {
        (**self).set_active_tenant(token, tenant_id).await
    }
}

/// Build the canonical [`Session`] for `token`.
///
/// Permissions are computed for the session's active tenant at load time, so
/// a revoked permission is visible on the very next check.
pub async fn load_session(
    sessions: &dyn SessionStore,
    rbac: &dyn RbacStore,
    token: &str,
) -> Result<Option<Session>, StoreError> {
    let Some(record) = sessions.lookup(token).await? else {
        return Ok(None);
    };
    let permissions = rbac
        .permissions_for(&record.user_id, record.active_tenant_id.as_ref())
        .await?;
    Ok(Some(Session::new(
        record.user_id,
        permissions,
        record.token,
        record.active_tenant_id,
    )))
}
