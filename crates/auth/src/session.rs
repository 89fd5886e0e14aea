//! Canonical session shape consumed by the guards.
//!
//! Sessions are issued elsewhere. Whatever the upstream shape, it is
//! normalized into [`Session`] once, at ingestion; guards read
//! `session.user.permissions` and nothing else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cerbero_core::{TenantId, UserId};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("session is missing {0}")]
    Missing(&'static str),
}

/// `{ user: { id, permissions }, session: { token, activeTenantId } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub session: SessionInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    /// Effective permissions in the active tenant, as issued.
    ///
    /// Kept as raw strings: malformed entries simply never match.
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub token: String,
    #[serde(default)]
    pub active_tenant_id: Option<TenantId>,
}

impl core::fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionInfo")
            .field("token", &"[REDACTED]")
            .field("active_tenant_id", &self.active_tenant_id)
            .finish()
    }
}

impl Session {
    pub fn new(
        user_id: UserId,
        permissions: Vec<String>,
        token: impl Into<String>,
        active_tenant_id: Option<TenantId>,
    ) -> Self {
        Self {
            user: SessionUser {
                id: user_id,
                permissions,
            },
            session: SessionInfo {
                token: token.into(),
                active_tenant_id,
            },
        }
    }

    /// Validate an upstream payload into the canonical shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SessionError> {
        let session: Session = serde_json::from_value(value)?;
        session.validate()?;
        Ok(session)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.user.id.as_str().is_empty() {
            return Err(SessionError::Missing("user.id"));
        }
        if self.session.token.is_empty() {
            return Err(SessionError::Missing("session.token"));
        }
        Ok(())
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    pub fn token(&self) -> &str {
        &self.session.token
    }

    pub fn active_tenant_id(&self) -> Option<&TenantId> {
        self.session.active_tenant_id.as_ref()
    }

    pub fn held_permissions(&self) -> &[String] {
        &self.user.permissions
    }
}
