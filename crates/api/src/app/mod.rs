//! HTTP application wiring (Axum router + services).
//!
//! - `services.rs`: store and guard wiring
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware::{self, SessionState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let session_state = SessionState {
        sessions: services.sessions.clone(),
        rbac: services.rbac.clone(),
    };

    let api = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            session_state,
            middleware::session_middleware,
        ));

    Router::new().nest("/api", api)
        .layer(ServiceBuilder::new())
}

pub use services::AppServices;
