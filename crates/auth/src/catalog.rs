//! Static permission catalog.
//!
//! The catalog is compiled in: permissions are not user-editable data. Roles
//! reference entries from here; the resolution engine itself never consults
//! the catalog (it only compares names), so unknown names simply never match.

use serde::Serialize;

use crate::permissions::{Permission, SUPER_ADMIN};

/// Permission definition (for seeding, audit and display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDefinition {
    pub name: Permission,
    pub resource: &'static str,
    pub action: &'static str,
    pub description: &'static str,
}

macro_rules! catalog {
    ($( $name:literal => $resource:literal, $action:literal, $description:literal; )*) => {
        const ENTRIES: &[(&str, &str, &str, &str)] = &[
            $( ($name, $resource, $action, $description), )*
        ];
    };
}

catalog! {
    "super:admin" => "super", "admin", "Acceso total al sistema, ignora cualquier otra comprobación";

    "dashboard:acceder" => "dashboard", "acceder", "Ver el panel principal";

    "usuarios:gestionar" => "usuarios", "gestionar", "Gestión completa de usuarios";
    "usuarios:acceder" => "usuarios", "acceder", "Ver el listado de usuarios";
    "usuarios:crear" => "usuarios", "crear", "Crear usuarios";
    "usuarios:editar" => "usuarios", "editar", "Editar usuarios";
    "usuarios:eliminar" => "usuarios", "eliminar", "Eliminar usuarios";

    "roles:gestionar" => "roles", "gestionar", "Gestión completa de roles";
    "roles:acceder" => "roles", "acceder", "Ver roles y permisos";
    "roles:crear" => "roles", "crear", "Crear roles";
    "roles:editar" => "roles", "editar", "Editar roles y sus permisos";
    "roles:eliminar" => "roles", "eliminar", "Eliminar roles";

    "tenants:gestionar" => "tenants", "gestionar", "Gestión completa de empresas";
    "tenants:acceder" => "tenants", "acceder", "Ver empresas";
    "tenants:crear" => "tenants", "crear", "Crear empresas";
    "tenants:editar" => "tenants", "editar", "Editar empresas";

    "vacantes:gestionar" => "vacantes", "gestionar", "Gestión completa de vacantes";
    "vacantes:acceder" => "vacantes", "acceder", "Ver vacantes";
    "vacantes:crear" => "vacantes", "crear", "Crear vacantes";
    "vacantes:editar" => "vacantes", "editar", "Editar vacantes";
    "vacantes:eliminar" => "vacantes", "eliminar", "Eliminar vacantes";

    "leads:gestionar" => "leads", "gestionar", "Gestión completa de leads";
    "leads:acceder" => "leads", "acceder", "Ver leads";
    "leads:crear" => "leads", "crear", "Crear leads";
    "leads:editar" => "leads", "editar", "Editar leads";
    "leads:eliminar" => "leads", "eliminar", "Eliminar leads";

    "ingresos:gestionar" => "ingresos", "gestionar", "Gestión completa de ingresos";
    "ingresos:acceder" => "ingresos", "acceder", "Ver ingresos";
    "ingresos:crear" => "ingresos", "crear", "Registrar ingresos";
    "ingresos:editar" => "ingresos", "editar", "Editar ingresos";

    "notificaciones:gestionar" => "notificaciones", "gestionar", "Gestión completa de notificaciones";
    "notificaciones:acceder" => "notificaciones", "acceder", "Ver plantillas de notificación";
    "notificaciones:editar" => "notificaciones", "editar", "Editar plantillas de notificación";
}

/// Full catalog, in declaration order.
pub fn catalog() -> impl Iterator<Item = PermissionDefinition> {
    ENTRIES
        .iter()
        .map(|&(name, resource, action, description)| PermissionDefinition {
            name: Permission::from_static(name),
            resource,
            action,
            description,
        })
}

pub fn find(name: &str) -> Option<PermissionDefinition> {
    catalog().find(|d| d.name.as_str() == name)
}

pub fn is_known(name: &str) -> bool {
    ENTRIES.iter().any(|&(n, ..)| n == name)
}

/// Distinct resources, excluding the reserved `super` pseudo-resource.
pub fn resources() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for &(name, resource, ..) in ENTRIES {
        if name != SUPER_ADMIN && !out.contains(&resource) {
            out.push(resource);
        }
    }
    out
}

pub fn by_resource(resource: &str) -> Vec<PermissionDefinition> {
    catalog().filter(|d| d.resource == resource).collect()
}

/// Permissions a tenant administrator may hand out: everything except the
/// global bypass.
pub fn assignable() -> Vec<PermissionDefinition> {
    catalog().filter(|d| !d.name.is_super_admin()).collect()
}
