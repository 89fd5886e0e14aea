//! Route classification table.
//!
//! Data, not logic: a static `path -> permission` map plus the public and
//! authenticated-only sets and the landing-page priority list. Lookups are
//! total: they never panic and distinguish "no requirement" from "this is
//! not a path at all".

use cerbero_auth::Permission;

/// One `path -> permission` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub permission: Permission,
}

/// What a path requires once public/authenticated-only sets are ruled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRequirement {
    /// Exact entry, or the nearest ancestor path that has one.
    Permission(Permission),
    /// Well-formed path with no entry anywhere up its ancestry.
    NoRequirement,
    /// Empty, relative, or otherwise not a navigable path.
    MalformedPath,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    pub public_paths: Vec<&'static str>,
    pub authenticated_only_paths: Vec<&'static str>,
    /// Ordered: the default-route resolver scans this in table order.
    pub permissions: Vec<RouteEntry>,
    pub priority_order: Vec<&'static str>,
    pub super_admin_path: &'static str,
    pub fallback_path: &'static str,
}

const fn entry(path: &'static str, permission: &'static str) -> RouteEntry {
    RouteEntry {
        path,
        permission: Permission::from_static(permission),
    }
}

impl RouteTable {
    /// The compiled application table.
    pub fn standard() -> Self {
        Self {
            public_paths: vec![
                "/",
                "/sign-in",
                "/sign-up",
                "/recuperar-contrasena",
                "/api/auth",
                "/api/health",
            ],
            authenticated_only_paths: vec!["/acceso-denegado", "/perfil", "/seleccionar-empresa"],
            permissions: vec![
                entry("/admin/super", "super:admin"),
                entry("/dashboard", "dashboard:acceder"),
                entry("/admin/usuarios", "usuarios:acceder"),
                entry("/admin/usuarios/nuevo", "usuarios:crear"),
                entry("/admin/roles", "roles:acceder"),
                entry("/admin/roles/nuevo", "roles:crear"),
                entry("/admin/empresas", "tenants:acceder"),
                entry("/vacantes", "vacantes:acceder"),
                entry("/vacantes/nueva", "vacantes:crear"),
                entry("/leads", "leads:acceder"),
                entry("/leads/nuevo", "leads:crear"),
                entry("/ingresos", "ingresos:acceder"),
                entry("/ingresos/nuevo", "ingresos:crear"),
                entry("/notificaciones", "notificaciones:acceder"),
            ],
            priority_order: vec!["/dashboard", "/vacantes", "/leads", "/ingresos", "/admin/usuarios"],
            super_admin_path: "/admin/super",
            fallback_path: "/acceso-denegado",
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        match normalize(path) {
            Some(path) => self.public_paths.iter().any(|p| covers(p, path)),
            None => false,
        }
    }

    pub fn is_authenticated_only(&self, path: &str) -> bool {
        match normalize(path) {
            Some(path) => self.authenticated_only_paths.iter().any(|p| covers(p, path)),
            None => false,
        }
    }

    fn exact(&self, path: &str) -> Option<&Permission> {
        self.permissions
            .iter()
            .find(|e| e.path == path)
            .map(|e| &e.permission)
    }

    /// Required permission for `path`.
    ///
    /// Exact entry first, then ancestors from most to least specific, so
    /// `/admin/usuarios/42` inherits `/admin/usuarios`.
    pub fn resolve(&self, path: &str) -> RouteRequirement {
        let Some(path) = normalize(path) else {
            return RouteRequirement::MalformedPath;
        };

        let mut candidate = path;
        loop {
            if let Some(permission) = self.exact(candidate) {
                return RouteRequirement::Permission(permission.clone());
            }
            match candidate.rfind('/') {
                Some(idx) if idx > 0 => candidate = &candidate[..idx],
                _ => return RouteRequirement::NoRequirement,
            }
        }
    }

    /// Permission guarding a path, ignoring the public/authenticated sets.
    pub fn required_permission(&self, path: &str) -> Option<Permission> {
        match self.resolve(path) {
            RouteRequirement::Permission(p) => Some(p),
            RouteRequirement::NoRequirement | RouteRequirement::MalformedPath => None,
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Strip query/fragment and trailing slashes; `None` if not an absolute path.
pub fn normalize(path: &str) -> Option<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    if !path.starts_with('/') || path.contains("//") {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    Some(if trimmed.is_empty() { "/" } else { trimmed })
}

/// `prefix` equals `path` or is one of its ancestors (segment-aware).
fn covers(prefix: &str, path: &str) -> bool {
    if prefix == path {
        return true;
    }
    prefix != "/"
        && path.starts_with(prefix)
        && path[prefix.len()..].starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerbero_auth::parse_permission;

    fn table() -> RouteTable {
        RouteTable::standard()
    }

    #[test]
    fn every_entry_is_a_well_formed_permission() {
        for e in &table().permissions {
            assert!(parse_permission(e.permission.as_str()).is_some(), "{}", e.path);
            assert!(normalize(e.path) == Some(e.path), "{} is not normalized", e.path);
        }
    }

    #[test]
    fn priority_paths_and_super_admin_path_are_in_the_table() {
        let t = table();
        for p in &t.priority_order {
            assert!(t.required_permission(p).is_some(), "{p}");
        }
        assert_eq!(
            t.required_permission(t.super_admin_path).map(|p| p.is_super_admin()),
            Some(true)
        );
    }

    #[test]
    fn parameterized_children_inherit_the_parent_requirement() {
        let t = table();
        assert_eq!(t.resolve("/admin/usuarios/42"), t.resolve("/admin/usuarios"));
        assert_eq!(
            t.resolve("/admin/usuarios/42/editar"),
            RouteRequirement::Permission(Permission::parse("usuarios:acceder").unwrap())
        );
    }

    #[test]
    fn most_specific_entry_wins() {
        assert_eq!(
            table().required_permission("/leads/nuevo").unwrap().as_str(),
            "leads:crear"
        );
        assert_eq!(
            table().required_permission("/leads/nuevo/").unwrap().as_str(),
            "leads:crear"
        );
    }

    #[test]
    fn unknown_and_malformed_are_distinct() {
        assert_eq!(table().resolve("/desconocido/1"), RouteRequirement::NoRequirement);
        assert_eq!(table().resolve(""), RouteRequirement::MalformedPath);
        assert_eq!(table().resolve("admin/usuarios"), RouteRequirement::MalformedPath);
        assert_eq!(table().resolve("//evil.example"), RouteRequirement::MalformedPath);
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        assert_eq!(table().resolve("/vacantes?page=2"), table().resolve("/vacantes"));
        assert_eq!(normalize("/vacantes/#top"), Some("/vacantes"));
        assert_eq!(normalize("/"), Some("/"));
    }

    #[test]
    fn public_matching_is_exact_or_segment_prefix() {
        let t = table();
        assert!(t.is_public("/sign-in"));
        assert!(t.is_public("/sign-in/factor-one"));
        assert!(!t.is_public("/sign-inx"));
        assert!(t.is_public("/"));
        // Root is exact only, otherwise everything would be public.
        assert!(!t.is_public("/admin/usuarios"));
        assert!(t.is_authenticated_only("/perfil/seguridad"));
    }
}
