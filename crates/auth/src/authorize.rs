//! Permission resolution engine.
//!
//! Inputs are deliberately flat: the caller's held permission names and one or
//! more required names. Everything here is pure and reads only, so it is safe
//! to call from any number of tasks without synchronization.
//!
//! Resolution order for a single requirement:
//! 1. `super:admin` held → granted.
//! 2. the exact name held → granted.
//! 3. `<resource>:gestionar` held for the required resource → granted.
//! 4. otherwise denied. A malformed requirement just fails step 3.

use serde::Serialize;
use thiserror::Error;

use crate::permissions::{SUPER_ADMIN, parse_permission};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

fn holds<S: AsRef<str>>(held: &[S], name: &str) -> bool {
    held.iter().any(|p| p.as_ref() == name)
}

pub fn is_super_admin<S: AsRef<str>>(held: &[S]) -> bool {
    holds(held, SUPER_ADMIN)
}

/// Does `held` satisfy `required`?
///
/// `<resource>:gestionar` subsumes every granular permission on the resource,
/// never the other way around.
pub fn has_permission<S: AsRef<str>>(held: &[S], required: &str) -> bool {
    if is_super_admin(held) || holds(held, required) {
        return true;
    }
    match parse_permission(required) {
        Some(parsed) => holds(held, &parsed.modular_name()),
        None => false,
    }
}

pub fn has_any_permission<S, R>(held: &[S], required: &[R]) -> bool
where
    S: AsRef<str>,
    R: AsRef<str>,
{
    if is_super_admin(held) {
        return true;
    }
    required.iter().any(|r| has_permission(held, r.as_ref()))
}

/// Vacuously true for an empty `required` list.
pub fn has_all_permissions<S, R>(held: &[S], required: &[R]) -> bool
where
    S: AsRef<str>,
    R: AsRef<str>,
{
    if is_super_admin(held) {
        return true;
    }
    required.iter().all(|r| has_permission(held, r.as_ref()))
}

/// Does `held` carry any permission at all on `resource`?
pub fn has_resource_access<S: AsRef<str>>(held: &[S], resource: &str) -> bool {
    if is_super_admin(held) {
        return true;
    }
    held.iter()
        .filter_map(|p| parse_permission(p.as_ref()))
        .any(|parsed| parsed.resource == resource)
}

/// [`has_permission`] as a `Result`, for use-case code that propagates with `?`.
pub fn authorize<S: AsRef<str>>(held: &[S], required: &str) -> Result<(), AuthzError> {
    if has_permission(held, required) {
        Ok(())
    } else {
        tracing::trace!(required, held = held.len(), "permission missing");
        Err(AuthzError::Forbidden(required.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Access Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Which rule decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    SuperAdmin,
    Exact,
    Modular,
    Missing,
    MalformedRequirement,
}

/// Detailed explanation of a resolution decision.
///
/// Answers "why was this allowed/denied?" for audit and debugging endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct AccessExplanation {
    pub required_permission: String,
    pub granted: bool,
    pub kind: GrantKind,
    pub reason: String,
    /// Held permissions on the same resource, sorted.
    pub related_permissions: Vec<String>,
    pub suggestions: Vec<String>,
}

pub fn explain_access<S: AsRef<str>>(held: &[S], required: &str) -> AccessExplanation {
    let parsed = parse_permission(required);

    let mut related: Vec<String> = match parsed {
        Some(req) => held
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| parse_permission(p).is_some_and(|h| h.resource == req.resource))
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };
    related.sort();
    related.dedup();

    let (granted, kind, reason, suggestions) = if is_super_admin(held) {
        (
            true,
            GrantKind::SuperAdmin,
            format!("'{SUPER_ADMIN}' bypasses every check"),
            Vec::new(),
        )
    } else if holds(held, required) {
        (
            true,
            GrantKind::Exact,
            format!("holds '{required}'"),
            Vec::new(),
        )
    } else if let Some(req) = parsed {
        let modular = req.modular_name();
        if holds(held, &modular) {
            (
                true,
                GrantKind::Modular,
                format!("'{modular}' subsumes '{required}'"),
                Vec::new(),
            )
        } else {
            (
                false,
                GrantKind::Missing,
                format!("neither '{required}' nor '{modular}' is held"),
                vec![
                    format!("Grant '{required}' to one of the user's roles in this tenant"),
                    format!("Grant '{modular}' to cover every action on '{}'", req.resource),
                ],
            )
        }
    } else {
        (
            false,
            GrantKind::MalformedRequirement,
            format!("'{required}' is not of the form '<resource>:<action>'"),
            vec!["Fix the permission name in the route or use-case declaration".to_string()],
        )
    };

    AccessExplanation {
        required_permission: required.to_string(),
        granted,
        kind,
        reason,
        related_permissions: related,
        suggestions,
    }
}
