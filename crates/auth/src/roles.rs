//! Roles, role permission sets and user-role assignments.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use cerbero_core::{DomainError, DomainResult, Entity, RoleId, TenantId, TenantOwned, UserId};

use crate::permissions::{Permission, PermissionParseError};

/// Name of the hidden global role carrying `super:admin`.
pub const ADMINISTRATOR_ROLE: &str = "administrator";

/// A role, either scoped to one tenant or global (`tenant_id = None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub tenant_id: Option<TenantId>,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>, tenant_id: Option<TenantId>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("role name must not be empty"));
        }
        Ok(Self { id, name, tenant_id })
    }

    /// The hidden global administrator role.
    pub fn administrator(id: RoleId) -> Self {
        Self {
            id,
            name: ADMINISTRATOR_ROLE.to_string(),
            tenant_id: None,
        }
    }

    pub fn is_global(&self) -> bool {
        self.tenant_id.is_none()
    }

    pub fn key(&self) -> RoleKey {
        match &self.tenant_id {
            Some(tenant_id) => RoleKey::Tenant {
                tenant_id: tenant_id.clone(),
                name: self.name.clone(),
            },
            None => RoleKey::Global {
                name: self.name.clone(),
            },
        }
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &RoleId {
        &self.id
    }
}

impl TenantOwned for Role {
    fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref()
    }
}

/// Uniqueness key for roles.
///
/// Tenant roles are unique per `(tenant, name)`. Global roles have their own
/// namespace: `NULL` never compares equal in a composite index, so the
/// null-tenant case is a separate rule rather than a special value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoleKey {
    Tenant { tenant_id: TenantId, name: String },
    Global { name: String },
}

/// The complete permission set of one role.
///
/// Sets are replaced wholesale (delete-all-then-insert), never merged, so the
/// type only offers construction from a full list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RolePermissionSet(BTreeSet<Permission>);

impl RolePermissionSet {
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self(permissions.into_iter().collect())
    }

    /// Parse a raw list, rejecting the whole set on the first malformed name.
    pub fn parse<I, S>(names: I) -> Result<Self, PermissionParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions = names
            .into_iter()
            .map(|n| Permission::parse(n.into()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self(permissions))
    }

    /// Reject `super:admin` on tenant-scoped roles.
    ///
    /// Only the global administrator role may carry the bypass; a tenant admin
    /// granting it would escalate past every tenant boundary.
    pub fn validate_for(&self, role: &Role) -> DomainResult<()> {
        if !role.is_global() && self.0.iter().any(Permission::is_super_admin) {
            return Err(DomainError::privilege_escalation(format!(
                "tenant role '{}' cannot carry the global bypass",
                role.name
            )));
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|p| p.as_str().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Assignment of a role to a user within a tenant (`None` = global assignment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub tenant_id: Option<TenantId>,
}

impl UserRole {
    /// Assign `role` to `user_id` in the role's own scope.
    pub fn for_role(user_id: UserId, role: &Role) -> Self {
        Self {
            user_id,
            role_id: role.id.clone(),
            tenant_id: role.tenant_id.clone(),
        }
    }

    pub fn is_global(&self) -> bool {
        self.tenant_id.is_none()
    }
}

impl TenantOwned for UserRole {
    fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant_role(name: &str, tenant: &str) -> Role {
        Role::new(RoleId::from_raw(name), name, Some(TenantId::from_raw(tenant))).unwrap()
    }

    #[test]
    fn role_keys_separate_global_and_tenant_namespaces() {
        let a = tenant_role("ventas", "T1");
        let b = tenant_role("ventas", "T2");
        let global = Role::administrator(RoleId::from_raw("root"));
        assert_ne!(a.key(), b.key());
        assert_eq!(global.key(), RoleKey::Global { name: ADMINISTRATOR_ROLE.to_string() });
        assert!(global.is_global());
    }

    #[test]
    fn empty_role_name_is_rejected() {
        assert!(Role::new(RoleId::new(), "  ", None).is_err());
    }

    #[test]
    fn permission_set_parse_is_all_or_nothing() {
        assert!(RolePermissionSet::parse(["leads:crear", "broken"]).is_err());
        let set = RolePermissionSet::parse(["leads:crear", "leads:crear", "roles:editar"]).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn tenant_roles_cannot_hold_super_admin() {
        let set = RolePermissionSet::parse(["super:admin"]).unwrap();
        assert!(matches!(
            set.validate_for(&tenant_role("jefe", "T1")),
            Err(DomainError::PrivilegeEscalation(_))
        ));
        assert!(set.validate_for(&Role::administrator(RoleId::new())).is_ok());
    }

    #[test]
    fn assignments_inherit_role_scope() {
        let role = tenant_role("ventas", "T1");
        let assignment = UserRole::for_role(UserId::from_raw("u1"), &role);
        assert_eq!(assignment.tenant_id, Some(TenantId::from_raw("T1")));
        assert!(assignment.visible_from(&TenantId::from_raw("T1")));
        assert!(!assignment.visible_from(&TenantId::from_raw("T2")));
    }
}
