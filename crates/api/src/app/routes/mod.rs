use axum::{
    routing::{get, post},
    Router,
};

pub mod access;
pub mod rbac;
pub mod system;
pub mod tenants;
pub mod vacancies;

/// Router for all `/api` endpoints. Every handler sees the session
/// middleware's [`crate::context::RequestSession`].
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/whoami", get(system::whoami))
        .route("/access/check", post(access::check))
        .route("/access/default-route", get(access::default_route))
        .route("/access/explain", get(access::explain))
        .nest("/tenants", tenants::router())
        .nest("/rbac", rbac::router())
        .nest("/vacantes", vacancies::router())
}
