//! Entity traits: identity and tenant ownership.

use crate::TenantId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Marks records that live inside a tenant boundary.
///
/// `None` is reserved for global records (the hidden administrator role and
/// its assignments); everything else belongs to exactly one tenant.
pub trait TenantOwned {
    fn tenant_id(&self) -> Option<&TenantId>;

    /// Whether this record is visible from `tenant`.
    ///
    /// Global records are visible from everywhere.
    fn visible_from(&self, tenant: &TenantId) -> bool {
        match self.tenant_id() {
            Some(owner) => owner == tenant,
            None => true,
        }
    }
}
