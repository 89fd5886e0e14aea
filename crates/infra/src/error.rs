use thiserror::Error;

use cerbero_auth::PermissionParseError;
use cerbero_core::DomainError;

/// Storage/adapter failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record is not a JSON object")]
    InvalidRecord,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unknown permission(s): {0:?}")]
    UnknownPermissions(Vec<String>),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Permission(#[from] PermissionParseError),

    #[error("lock poisoned")]
    Poisoned,

    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
