use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The catalog-wide bypass permission.
pub const SUPER_ADMIN: &str = "super:admin";

/// Action that turns `<resource>:<action>` into a modular permission
/// subsuming every granular action on the same resource.
pub const MODULAR_ACTION: &str = "gestionar";

/// A `<resource>:<action>` pair split out of a permission name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ParsedPermission<'a> {
    pub resource: &'a str,
    pub action: &'a str,
}

impl ParsedPermission<'_> {
    pub fn is_modular(&self) -> bool {
        self.action == MODULAR_ACTION
    }

    /// Name of the modular permission covering this resource.
    pub fn modular_name(&self) -> String {
        format!("{}:{}", self.resource, MODULAR_ACTION)
    }
}

/// Split a permission name into resource and action.
///
/// Returns `None` unless the name has exactly one colon with non-empty text on
/// both sides. Never guesses: `"a:b:c"`, `"foo"`, `":x"` are all `None`.
pub fn parse_permission(name: &str) -> Option<ParsedPermission<'_>> {
    let (resource, action) = name.split_once(':')?;
    if resource.is_empty() || action.is_empty() || action.contains(':') {
        return None;
    }
    Some(ParsedPermission { resource, action })
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed permission '{0}': expected '<resource>:<action>'")]
pub struct PermissionParseError(pub String);

/// Validated permission identifier.
///
/// Always of the shape `<resource>:<action>`. Resolution functions take raw
/// `&str` lists so callers can hand over whatever the session carries; this
/// type is used where names are *stored* (role permission sets, route table).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn parse(name: impl Into<Cow<'static, str>>) -> Result<Self, PermissionParseError> {
        let name = name.into();
        if parse_permission(&name).is_none() {
            return Err(PermissionParseError(name.into_owned()));
        }
        Ok(Self(name))
    }

    /// Build a permission from a compile-time literal without validation.
    ///
    /// For compiled tables (catalog, route classification) whose entries are
    /// checked by tests. Runtime input goes through [`Permission::parse`].
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn super_admin() -> Self {
        Self::from_static(SUPER_ADMIN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parts(&self) -> ParsedPermission<'_> {
        // Construction guarantees the shape.
        parse_permission(&self.0).unwrap_or(ParsedPermission {
            resource: "",
            action: "",
        })
    }

    pub fn resource(&self) -> &str {
        self.parts().resource
    }

    pub fn action(&self) -> &str {
        self.parts().action
    }

    pub fn is_super_admin(&self) -> bool {
        self.as_str() == SUPER_ADMIN
    }

    pub fn is_modular(&self) -> bool {
        self.parts().is_modular()
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.0.into_owned()
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
