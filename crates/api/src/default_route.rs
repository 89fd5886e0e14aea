//! Landing page after sign-in or tenant switch.

use cerbero_auth::{has_permission, is_super_admin};

use crate::routing::RouteTable;

/// Pick the landing path for a held permission set.
///
/// Priority list first, then the whole table in order (minus the
/// super-admin page), then the fallback.
pub fn get_default_route<S: AsRef<str>>(table: &RouteTable, held: &[S]) -> &'static str {
    if held.is_empty() {
        return table.fallback_path;
    }
    if is_super_admin(held) {
        return table.super_admin_path;
    }

    let satisfied = |path: &str| {
        table
            .required_permission(path)
            .is_some_and(|required| has_permission(held, required.as_str()))
    };

    if let Some(path) = table.priority_order.iter().copied().find(|p| satisfied(*p)) {
        return path;
    }

    table
        .permissions
        .iter()
        .filter(|e| e.path != table.super_admin_path)
        .find(|e| has_permission(held, e.permission.as_str()))
        .map(|e| e.path)
        .unwrap_or(table.fallback_path)
}
