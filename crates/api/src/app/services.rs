use std::sync::Arc;

use cerbero_infra::read_model::InMemoryDataClient;
use cerbero_infra::scoping::{DataClient, TenantScopedClient};
use cerbero_infra::store::{InMemoryRbacStore, InMemorySessionStore, RbacStore, SessionStore};

use crate::config::{ApiConfig, Environment};
use crate::guard::ServerGuard;
use crate::routing::RouteTable;

/// Everything handlers need, shared behind one `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub guard: ServerGuard,
    pub rbac: Arc<dyn RbacStore>,
    pub sessions: Arc<dyn SessionStore>,
    /// Data client with tenant read scoping applied.
    pub data: Arc<dyn DataClient>,
}

impl AppServices {
    pub fn new(
        environment: Environment,
        rbac: Arc<dyn RbacStore>,
        sessions: Arc<dyn SessionStore>,
        data: Arc<dyn DataClient>,
    ) -> Self {
        Self {
            guard: ServerGuard::new(Arc::new(RouteTable::standard()), environment),
            rbac,
            sessions,
            data: Arc::new(TenantScopedClient::new(data)),
        }
    }

    pub fn table(&self) -> &RouteTable {
        self.guard.table()
    }
}

/// Wire stores from configuration.
///
/// Postgres backs RBAC and sessions when `DATABASE_URL` is set; domain
/// records always use the in-process client.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let data: Arc<dyn DataClient> = Arc::new(InMemoryDataClient::new());

    #[cfg(feature = "postgres")]
    if let Some(url) = &config.database_url {
        let rbac = cerbero_infra::store::PostgresRbacStore::connect(url).await?;
        rbac.migrate().await?;
        let sessions = cerbero_infra::store::PostgresSessionStore::new(rbac.pool().clone());
        tracing::info!("using postgres rbac/session stores");
        return Ok(AppServices::new(config.environment, Arc::new(rbac), Arc::new(sessions), data));
    }

    if config.environment.is_production() {
        anyhow::bail!("DATABASE_URL is required in production");
    }
    tracing::warn!("DATABASE_URL not set; using in-memory stores (data is lost on restart)");
    Ok(AppServices::new(
        config.environment,
        Arc::new(InMemoryRbacStore::new()),
        Arc::new(InMemorySessionStore::new()),
        data,
    ))
}
