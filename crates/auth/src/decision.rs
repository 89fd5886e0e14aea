//! Route access verdicts shared by the server guard and its clients.

use serde::{Deserialize, Serialize};

/// Why a route check ended the way it did.
///
/// Unauthenticated and insufficient-permission denials are distinct reasons
/// and must never be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessReason {
    #[serde(rename = "public")]
    Public,
    #[serde(rename = "unauthenticated")]
    Unauthenticated,
    #[serde(rename = "authenticated")]
    Authenticated,
    #[serde(rename = "super-admin")]
    SuperAdmin,
    #[serde(rename = "no permission required")]
    NoPermissionRequired,
    #[serde(rename = "permission verified")]
    PermissionVerified,
    #[serde(rename = "permission insufficient")]
    PermissionInsufficient,
    #[serde(rename = "malformed path")]
    MalformedPath,
}

impl AccessReason {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessReason::Public => "public",
            AccessReason::Unauthenticated => "unauthenticated",
            AccessReason::Authenticated => "authenticated",
            AccessReason::SuperAdmin => "super-admin",
            AccessReason::NoPermissionRequired => "no permission required",
            AccessReason::PermissionVerified => "permission verified",
            AccessReason::PermissionInsufficient => "permission insufficient",
            AccessReason::MalformedPath => "malformed path",
        }
    }
}

impl core::fmt::Display for AccessReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{hasAccess, reason, requiredPermission?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub has_access: bool,
    pub reason: AccessReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_permission: Option<String>,
}

impl AccessDecision {
    pub fn allow(reason: AccessReason) -> Self {
        Self {
            has_access: true,
            reason,
            required_permission: None,
        }
    }

    pub fn deny(reason: AccessReason) -> Self {
        Self {
            has_access: false,
            reason,
            required_permission: None,
        }
    }

    pub fn with_required(mut self, permission: impl Into<String>) -> Self {
        self.required_permission = Some(permission.into());
        self
    }
}
