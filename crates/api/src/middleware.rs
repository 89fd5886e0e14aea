use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use cerbero_infra::context::{TenantContext, run_with_context};
use cerbero_infra::store::{RbacStore, SessionStore, load_session};

use crate::app::errors::{json_error, store_error_to_response};
use crate::context::RequestSession;

#[derive(Clone)]
pub struct SessionState {
    pub sessions: Arc<dyn SessionStore>,
    pub rbac: Arc<dyn RbacStore>,
}

/// Resolve the caller's session and run the rest of the request inside a
/// fresh tenant context.
///
/// Anonymous requests pass through with an empty context; the route guard
/// and handlers decide what anonymous callers may do.
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?.map(str::to_string);

    let session = match token {
        Some(token) => load_session(state.sessions.as_ref(), state.rbac.as_ref(), &token)
            .await
            .map_err(store_error_to_response)?,
        None => None,
    };

    let ctx = session
        .as_ref()
        .map(TenantContext::from_session)
        .unwrap_or_default();
    req.extensions_mut().insert(RequestSession::new(session));

    Ok(run_with_context(ctx, next.run(req)).await)
}

/// `Ok(None)` without an `Authorization` header; a present but malformed
/// header is rejected rather than treated as anonymous.
fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, Response> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let malformed = || json_error(StatusCode::UNAUTHORIZED, "malformed_authorization", "expected 'Bearer <token>'");

    let header = header.to_str().map_err(|_| malformed())?;
    let token = header.strip_prefix("Bearer ").ok_or_else(malformed)?.trim();
    if token.is_empty() {
        return Err(malformed());
    }
    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&HeaderMap::new()).unwrap(), None);
        assert_eq!(extract_bearer(&headers("Bearer abc")).unwrap(), Some("abc"));
        assert!(extract_bearer(&headers("Basic abc")).is_err());
        assert!(extract_bearer(&headers("Bearer   ")).is_err());
    }
}
