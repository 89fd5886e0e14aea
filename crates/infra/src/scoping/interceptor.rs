//! Read-query tenant injection.
//!
//! Defense in depth, not the primary enforcement: every use-case still
//! filters by tenant itself. The interceptor catches omissions on reads.
//!
//! Rules for reads against tenant-owned kinds:
//! - context tenant set and filter silent on `tenantId` → inject it;
//! - filter already names a `tenantId` (any value) → untouched;
//! - context unset or global (`tenant_id = None`) → untouched.
//!
//! Writes are forwarded unchanged. Extending interception to writes needs
//! every write call site re-verified first.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::current_tenant_id;
use crate::error::StoreError;

use super::{DataClient, EntityKind, Filter, Query, TENANT_FIELD};

/// Apply the ambient tenant to a read filter.
///
/// Reads the context at call time, so one client instance can be shared by
/// every request.
pub fn scope_filter(kind: EntityKind, mut filter: Filter) -> Filter {
    if !kind.is_tenant_scoped() || filter.specifies_tenant() {
        return filter;
    }
    if let Some(tenant_id) = current_tenant_id() {
        tracing::trace!(%kind, tenant_id = %tenant_id, "injecting tenant filter");
        filter.insert(TENANT_FIELD, Value::String(tenant_id.into()));
    }
    filter
}

/// Decorator adding [`scope_filter`] to every read of the wrapped client.
#[derive(Debug, Clone)]
pub struct TenantScopedClient<C> {
    inner: C,
}

impl<C> TenantScopedClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C> DataClient for TenantScopedClient<C>
where
    C: DataClient,
{
    async fn find_many(&self, kind: EntityKind, mut query: Query) -> Result<Vec<Value>, StoreError> {
        query.filter = scope_filter(kind, query.filter);
        self.inner.find_many(kind, query).await
    }

    async fn find_first(&self, kind: EntityKind, mut query: Query) -> Result<Option<Value>, StoreError> {
        query.filter = scope_filter(kind, query.filter);
        self.inner.find_first(kind, query).await
    }

    async fn count(&self, kind: EntityKind, filter: Filter) -> Result<usize, StoreError> {
        self.inner.count(kind, scope_filter(kind, filter)).await
    }

    async fn create(&self, kind: EntityKind, record: Value) -> Result<Value, StoreError> {
        self.inner.create(kind, record).await
    }

    async fn update(&self, kind: EntityKind, filter: Filter, patch: Value) -> Result<usize, StoreError> {
        self.inner.update(kind, filter, patch).await
    }

    async fn delete(&self, kind: EntityKind, filter: Filter) -> Result<usize, StoreError> {
        self.inner.delete(kind, filter).await
    }
}
