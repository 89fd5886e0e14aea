//! Tenant query scoping over the data-access client.
//!
//! The data layer is modeled as an ORM-like client keyed by [`EntityKind`]
//! with equality [`Filter`]s. [`TenantScopedClient`] decorates any client and
//! adds the ambient tenant filter to read queries on tenant-owned kinds.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

pub mod interceptor;

pub use interceptor::{TenantScopedClient, scope_filter};

/// Field name carrying the owning tenant on every tenant-owned record.
pub const TENANT_FIELD: &str = "tenantId";

/// Entity types reachable through the data client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Vacancy,
    Lead,
    Income,
    NotificationTemplate,
    Role,
    UserRole,
    User,
    Tenant,
    Permission,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Vacancy,
        EntityKind::Lead,
        EntityKind::Income,
        EntityKind::NotificationTemplate,
        EntityKind::Role,
        EntityKind::UserRole,
        EntityKind::User,
        EntityKind::Tenant,
        EntityKind::Permission,
    ];

    /// Fixed allow-list of tenant-owned kinds.
    ///
    /// Users, tenants and the permission catalog are shared across tenants and
    /// are never auto-scoped.
    pub fn is_tenant_scoped(self) -> bool {
        matches!(
            self,
            EntityKind::Vacancy
                | EntityKind::Lead
                | EntityKind::Income
                | EntityKind::NotificationTemplate
                | EntityKind::Role
                | EntityKind::UserRole
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Vacancy => "vacancy",
            EntityKind::Lead => "lead",
            EntityKind::Income => "income",
            EntityKind::NotificationTemplate => "notification_template",
            EntityKind::Role => "role",
            EntityKind::UserRole => "user_role",
            EntityKind::User => "user",
            EntityKind::Tenant => "tenant",
            EntityKind::Permission => "permission",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality filter: every listed field must equal the given value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether the caller already said anything about the tenant,
    /// including an explicit `null`.
    pub fn specifies_tenant(&self) -> bool {
        self.0.contains_key(TENANT_FIELD)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, record: &Value) -> bool {
        let Some(obj) = record.as_object() else {
            return false;
        };
        self.0
            .iter()
            .all(|(field, expected)| obj.get(field).unwrap_or(&Value::Null) == expected)
    }

    pub(crate) fn insert(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }
}

/// A read query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "where", default)]
    pub filter: Filter,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// ORM-like data-access client.
///
/// Reads (`find_many`, `find_first`, `count`) are what the tenant interceptor
/// scopes. Writes are passed through as-is: callers scope them explicitly.
#[async_trait]
pub trait DataClient: Send + Sync {
    async fn find_many(&self, kind: EntityKind, query: Query) -> Result<Vec<Value>, StoreError>;

    async fn find_first(&self, kind: EntityKind, query: Query) -> Result<Option<Value>, StoreError>;

    async fn count(&self, kind: EntityKind, filter: Filter) -> Result<usize, StoreError>;

    async fn create(&self, kind: EntityKind, record: Value) -> Result<Value, StoreError>;

    /// Merge `patch` into every matching record; returns how many changed.
    async fn update(&self, kind: EntityKind, filter: Filter, patch: Value) -> Result<usize, StoreError>;

    async fn delete(&self, kind: EntityKind, filter: Filter) -> Result<usize, StoreError>;
}

#[async_trait]
impl<C> DataClient for Arc<C>
where
    C: DataClient + ?Sized,
{
    async fn find_many(&self, kind: EntityKind, query: Query) -> Result<Vec<Value>, StoreError> {
        (**self).find_many(kind, query).await
    }

    async fn find_first(&self, kind: EntityKind, query: Query) -> Result<Option<Value>, StoreError> {
        (**self).find_first(kind, query).await
    }

    async fn count(&self, kind: EntityKind, filter: Filter) -> Result<usize, StoreError> {
        (**self).count(kind, filter).await
    }

    async fn create(&self, kind: EntityKind, record: Value) -> Result<Value, StoreError> {
        (**self).create(kind, record).await
    }

    async fn update(&self, kind: EntityKind, filter: Filter, patch: Value) -> Result<usize, StoreError> {
        (**self).update(kind, filter, patch).await
    }

    async fn delete(&self, kind: EntityKind, filter: Filter) -> Result<usize, StoreError> {
        (**self).delete(kind, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn allow_list_covers_tenant_owned_kinds_only() {
        let scoped: Vec<_> = EntityKind::ALL.into_iter().filter(|k| k.is_tenant_scoped()).collect();
        assert!(scoped.contains(&EntityKind::Vacancy));
        assert!(scoped.contains(&EntityKind::Lead));
        assert!(!scoped.contains(&EntityKind::User));
        assert!(!scoped.contains(&EntityKind::Tenant));
        assert!(!scoped.contains(&EntityKind::Permission));
    }

    #[test]
    fn filter_matching_is_equality_on_every_field() {
        let record = json!({ "id": "1", "tenantId": "T1", "estado": "abierta" });
        assert!(Filter::new().matches(&record));
        assert!(Filter::new().eq("tenantId", "T1").matches(&record));
        assert!(!Filter::new().eq("tenantId", "T2").matches(&record));
        assert!(Filter::new().eq("borrado", Value::Null).matches(&record));
        assert!(!Filter::new().matches(&json!("not an object")));
    }

    #[test]
    fn explicit_null_tenant_counts_as_specified() {
        assert!(Filter::new().eq(TENANT_FIELD, Value::Null).specifies_tenant());
        assert!(!Filter::new().eq("id", "x").specifies_tenant());
    }

    #[test]
    fn query_wire_shape_uses_where() {
        let q: Query = serde_json::from_value(json!({ "where": { "tenantId": "T1" }, "limit": 5 })).unwrap();
        assert_eq!(q.filter.get("tenantId"), Some(&json!("T1")));
        assert_eq!(q.limit, Some(5));
    }
}
