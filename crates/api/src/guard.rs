//! Server-side route guard.
//!
//! [`can_access_route`] is the pure decision; [`ServerGuard`] wraps it with
//! denial logging. Rules, first match wins:
//!
//! 1. public path → allow
//! 2. no session → deny (unauthenticated)
//! 3. authenticated-only path → allow
//! 4. `super:admin` held → allow
//! 5. resolve the path's requirement (exact, then nearest ancestor)
//! 6. no requirement anywhere → allow
//! 7. otherwise the resolution engine decides
//!
//! Step 6 is a deliberate default-allow for unlisted routes: a path missing
//! from the table is reachable by any authenticated user.

use std::sync::Arc;

use cerbero_auth::{AccessDecision, AccessReason, Session, has_permission, is_super_admin};

use crate::config::Environment;
use crate::routing::{RouteRequirement, RouteTable};

/// Held permissions shown in non-production denial logs.
const LOGGED_PERMISSIONS: usize = 8;

pub fn can_access_route(table: &RouteTable, session: Option<&Session>, path: &str) -> AccessDecision {
    if table.is_public(path) {
        return AccessDecision::allow(AccessReason::Public);
    }

    let Some(session) = session else {
        return AccessDecision::deny(AccessReason::Unauthenticated);
    };

    if table.is_authenticated_only(path) {
        return AccessDecision::allow(AccessReason::Authenticated);
    }

    let held = session.held_permissions();
    if is_super_admin(held) {
        return AccessDecision::allow(AccessReason::SuperAdmin);
    }

    match table.resolve(path) {
        RouteRequirement::MalformedPath => AccessDecision::deny(AccessReason::MalformedPath),
        RouteRequirement::NoRequirement => AccessDecision::allow(AccessReason::NoPermissionRequired),
        RouteRequirement::Permission(required) => {
            if has_permission(held, required.as_str()) {
                AccessDecision::allow(AccessReason::PermissionVerified).with_required(required.as_str())
            } else {
                AccessDecision::deny(AccessReason::PermissionInsufficient).with_required(required.as_str())
            }
        }
    }
}

/// Route guard bound to a table and a logging policy.
#[derive(Debug, Clone)]
pub struct ServerGuard {
    table: Arc<RouteTable>,
    environment: Environment,
}

impl ServerGuard {
    pub fn new(table: Arc<RouteTable>, environment: Environment) -> Self {
        Self { table, environment }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    #[tracing::instrument(level = "debug", skip(self, session), fields(user_id))]
    pub fn check(&self, session: Option<&Session>, path: &str) -> AccessDecision {
        if let Some(s) = session {
            tracing::Span::current().record("user_id", tracing::field::display(s.user_id()));
        }

        let decision = can_access_route(&self.table, session, path);
        if !decision.has_access {
            self.log_denial(session, path, &decision);
        }
        decision
    }

    fn log_denial(&self, session: Option<&Session>, path: &str, decision: &AccessDecision) {
        let required = decision.required_permission.as_deref().unwrap_or("-");
        if self.environment.is_production() {
            tracing::warn!(path, reason = %decision.reason, required, "route access denied");
            return;
        }

        let held = session.map(Session::held_permissions).unwrap_or_default();
        let mut shown: Vec<&str> = held.iter().take(LOGGED_PERMISSIONS).map(String::as_str).collect();
        if held.len() > LOGGED_PERMISSIONS {
            shown.push("…");
        }
        tracing::warn!(
            path,
            reason = %decision.reason,
            required,
            held_count = held.len(),
            held = ?shown,
            "route access denied"
        );
    }
}
