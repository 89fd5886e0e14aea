use std::sync::Arc;

use anyhow::Context;

use cerbero_api::app::{build_app, services::build_services};
use cerbero_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cerbero_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "starting");

    let services = build_services(&config).await.context("failed to wire services")?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
