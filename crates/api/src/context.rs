use axum::http::StatusCode;
use axum::response::Response;

use cerbero_auth::Session;

use crate::app::errors::json_error;

/// Session resolved for the current request, if any.
///
/// Inserted by the session middleware on every request; `None` means the
/// caller is anonymous (no bearer token, or an unknown one).
#[derive(Debug, Clone, Default)]
pub struct RequestSession(Option<Session>);

impl RequestSession {
    pub fn new(session: Option<Session>) -> Self {
        Self(session)
    }

    pub fn get(&self) -> Option<&Session> {
        self.0.as_ref()
    }

    /// The session, or a 401 response for handlers that need one.
    pub fn require(&self) -> Result<&Session, Response> {
        self.0.as_ref().ok_or_else(|| {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "a valid session is required")
        })
    }
}
