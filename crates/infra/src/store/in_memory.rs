use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use cerbero_auth::{Role, RolePermissionSet, Tenant, TenantMembership, UserRole, catalog};
use cerbero_core::{DomainError, RoleId, TenantId, UserId};

use crate::error::StoreError;

use super::{RbacStore, SessionRecord, SessionStore};

#[derive(Debug, Default)]
struct RbacState {
    tenants: HashMap<TenantId, Tenant>,
    roles: HashMap<RoleId, Role>,
    role_permissions: HashMap<RoleId, RolePermissionSet>,
    assignments: HashSet<UserRole>,
}

/// In-memory RBAC store for tests/dev.
///
/// A single lock guards all tables, so a permission-set replacement is one
/// write critical section.
#[derive(Debug, Default)]
pub struct InMemoryRbacStore {
    inner: RwLock<RbacState>,
}

impl InMemoryRbacStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RbacStore for InMemoryRbacStore {
    async fn upsert_tenant(&self, tenant: Tenant) -> Result<(), StoreError> {
        let mut state = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let slug_taken = state
            .tenants
            .values()
            .any(|t| t.slug == tenant.slug && t.id != tenant.id);
        if slug_taken {
            return Err(StoreError::Conflict(format!("tenant slug '{}' is taken", tenant.slug)));
        }
        state.tenants.insert(tenant.id.clone(), tenant);
        Ok(())
    }

    async fn tenant(&self, tenant_id: &TenantId) -> Result<Option<Tenant>, StoreError> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.tenants.get(tenant_id).cloned())
    }

    async fn upsert_role(&self, role: Role) -> Result<(), StoreError> {
        let mut state = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let key = role.key();
        let clash = state.roles.values().any(|r| r.key() == key && r.id != role.id);
        if clash {
            return Err(StoreError::Conflict(format!("role '{}' already exists", role.name)));
        }
        state.roles.insert(role.id.clone(), role);
        Ok(())
    }

    async fn role(&self, role_id: &RoleId) -> Result<Option<Role>, StoreError> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.roles.get(role_id).cloned())
    }

    async fn assign_role(&self, assignment: UserRole) -> Result<(), StoreError> {
        let mut state = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let role = state
            .roles
            .get(&assignment.role_id)
            .ok_or_else(|| StoreError::NotFound(format!("role {}", assignment.role_id)))?;
        if role.tenant_id != assignment.tenant_id {
            return Err(DomainError::invariant("assignment tenant must match the role's tenant").into());
        }
        state.assignments.insert(assignment);
        Ok(())
    }

    async fn replace_role_permissions(
        &self,
        role_id: &RoleId,
        permissions: &RolePermissionSet,
    ) -> Result<(), StoreError> {
        let unknown: Vec<String> = permissions
            .iter()
            .filter(|p| !catalog::is_known(p.as_str()))
            .map(|p| p.to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(StoreError::UnknownPermissions(unknown));
        }

        let mut state = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let role = state
            .roles
            .get(role_id)
            .ok_or_else(|| StoreError::NotFound(format!("role {role_id}")))?;
        permissions.validate_for(role)?;
        state.role_permissions.insert(role_id.clone(), permissions.clone());
        Ok(())
    }

    async fn role_permissions(&self, role_id: &RoleId) -> Result<RolePermissionSet, StoreError> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.role_permissions.get(role_id).cloned().unwrap_or_default())
    }

    async fn memberships(&self, user_id: &UserId) -> Result<Vec<TenantMembership>, StoreError> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut by_tenant: BTreeMap<TenantId, BTreeSet<RoleId>> = BTreeMap::new();
        for a in state.assignments.iter().filter(|a| &a.user_id == user_id) {
            if let Some(tenant_id) = &a.tenant_id {
                by_tenant.entry(tenant_id.clone()).or_default().insert(a.role_id.clone());
            }
        }
        Ok(by_tenant
            .into_iter()
            .map(|(tenant_id, roles)| TenantMembership {
                tenant_id,
                roles: roles.into_iter().collect(),
            })
            .collect())
    }

    async fn permissions_for(
        &self,
        user_id: &UserId,
        tenant_id: Option<&TenantId>,
    ) -> Result<Vec<String>, StoreError> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut names = BTreeSet::new();
        let applicable = state.assignments.iter().filter(|a| {
            &a.user_id == user_id && (a.tenant_id.is_none() || a.tenant_id.as_ref() == tenant_id)
        });
        for a in applicable {
            if let Some(set) = state.role_permissions.get(&a.role_id) {
                names.extend(set.iter().map(|p| p.as_str().to_string()));
            }
        }
        Ok(names.into_iter().collect())
    }
}

/// In-memory stand-in for the external session issuer.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: SessionRecord) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(record.token.clone(), record);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(token).cloned())
    }

    async fn set_active_tenant(&self, token: &str, tenant_id: Option<TenantId>) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let record = map
            .get_mut(token)
            .ok_or_else(|| StoreError::NotFound("session".to_string()))?;
        record.active_tenant_id = tenant_id;
        Ok(())
    }
}
