//! Tenants, memberships and the tenant-switch policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cerbero_core::{DomainError, DomainResult, Entity, RoleId, TenantId};

/// A tenant (company) boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
}

impl Tenant {
    pub fn new(id: TenantId, name: impl Into<String>, slug: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let slug = slug.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("tenant name must not be empty"));
        }
        validate_slug(&slug)?;
        Ok(Self { id, name, slug })
    }
}

impl Entity for Tenant {
    type Id = TenantId;

    fn id(&self) -> &TenantId {
        &self.id
    }
}

/// Slugs are lowercase ascii words joined by single hyphens.
pub fn validate_slug(slug: &str) -> DomainResult<()> {
    let well_formed = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(DomainError::validation(format!("invalid tenant slug '{slug}'")))
    }
}

/// A user's roles inside one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TenantSwitchError {
    #[error("user does not belong to tenant '{0}'")]
    NotAMember(TenantId),

    #[error("only super-admins may leave every tenant")]
    GlobalScopeRequiresSuperAdmin,
}

/// Decide whether a user may make `target` their active tenant.
///
/// Super-admins may switch anywhere, including the global scope (`None`).
/// Everyone else must hold at least one role in the target tenant.
pub fn authorize_tenant_switch(
    memberships: &[TenantMembership],
    is_super_admin: bool,
    target: Option<&TenantId>,
) -> Result<(), TenantSwitchError> {
    if is_super_admin {
        return Ok(());
    }
    let Some(target) = target else {
        return Err(TenantSwitchError::GlobalScopeRequiresSuperAdmin);
    };
    let member = memberships
        .iter()
        .any(|m| &m.tenant_id == target && !m.roles.is_empty());
    if member {
        Ok(())
    } else {
        Err(TenantSwitchError::NotAMember(target.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(tenant: &str) -> TenantMembership {
        TenantMembership {
            tenant_id: TenantId::from_raw(tenant),
            roles: vec![RoleId::from_raw("r")],
        }
    }

    #[test]
    fn slug_rules() {
        assert!(validate_slug("acme-2024").is_ok());
        for bad in ["", "Acme", "acme--x", "-acme", "acme-", "ac me"] {
            assert!(validate_slug(bad).is_err(), "{bad}");
        }
        assert!(Tenant::new(TenantId::new(), "Acme", "acme").is_ok());
    }

    #[test]
    fn members_can_switch_to_their_tenants_only() {
        let memberships = vec![membership("T1")];
        let t1 = TenantId::from_raw("T1");
        let t2 = TenantId::from_raw("T2");
        assert_eq!(authorize_tenant_switch(&memberships, false, Some(&t1)), Ok(()));
        assert_eq!(
            authorize_tenant_switch(&memberships, false, Some(&t2)),
            Err(TenantSwitchError::NotAMember(t2.clone()))
        );
    }

    #[test]
    fn membership_without_roles_does_not_count() {
        let memberships = vec![TenantMembership {
            tenant_id: TenantId::from_raw("T1"),
            roles: vec![],
        }];
        assert!(authorize_tenant_switch(&memberships, false, Some(&TenantId::from_raw("T1"))).is_err());
    }

    #[test]
    fn global_scope_is_super_admin_only() {
        assert_eq!(
            authorize_tenant_switch(&[], false, None),
            Err(TenantSwitchError::GlobalScopeRequiresSuperAdmin)
        );
        assert_eq!(authorize_tenant_switch(&[], true, None), Ok(()));
        assert_eq!(authorize_tenant_switch(&[], true, Some(&TenantId::from_raw("T9"))), Ok(()));
    }
}
