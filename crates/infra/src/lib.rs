//! Infrastructure layer: ambient request context, tenant query scoping and
//! RBAC/session storage adapters.

pub mod context;
pub mod error;
pub mod read_model;
pub mod scoping;
pub mod store;

pub use context::{TenantContext, current_tenant_id, current_user_id, get_context, run_with_context};
pub use error::StoreError;
pub use scoping::{DataClient, EntityKind, Filter, Query, TenantScopedClient};
