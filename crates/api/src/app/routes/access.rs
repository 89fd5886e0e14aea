//! Route-access endpoints backing the client guard.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::Response,
    Json,
};

use cerbero_auth::{AccessDecision, AccessExplanation, explain_access};

use crate::app::dto::{AccessCheckRequest, DefaultRouteResponse, ExplainQuery};
use crate::app::services::AppServices;
use crate::context::RequestSession;
use crate::default_route::get_default_route;

/// Always answers 200 with a decision; anonymous callers get
/// `unauthenticated` rather than a 401 so the client can redirect.
pub async fn check(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<RequestSession>,
    Json(req): Json<AccessCheckRequest>,
) -> Json<AccessDecision> {
    Json(services.guard.check(session.get(), &req.path))
}

pub async fn default_route(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<RequestSession>,
) -> Result<Json<DefaultRouteResponse>, Response> {
    let session = session.require()?;
    let path = get_default_route(services.table(), session.held_permissions());
    Ok(Json(DefaultRouteResponse { path: path.to_string() }))
}

/// Explain how the caller's held set resolves `permission`.
pub async fn explain(
    Extension(session): Extension<RequestSession>,
    Query(query): Query<ExplainQuery>,
) -> Result<Json<AccessExplanation>, Response> {
    let session = session.require()?;
    Ok(Json(explain_access(session.held_permissions(), &query.permission)))
}
