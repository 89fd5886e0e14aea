//! Strongly-typed identifiers used across the authorization core.
//!
//! Identifiers are opaque strings: the persistence layer owns their format
//! (cuid, uuid, slug-like fixtures in tests). Newly minted ids are UUIDv7.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a tenant (multi-tenant boundary).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

/// Identifier of a user (actor identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

/// Identifier of a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Mint a fresh identifier (UUIDv7, time-ordered).
            ///
            /// Prefer passing IDs explicitly in tests for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Wrap an existing identifier without validation.
            ///
            /// Use [`FromStr`] for untrusted input.
            pub fn from_raw(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                if trimmed.len() != s.len() {
                    return Err(DomainError::invalid_id(format!(
                        "{}: surrounding whitespace",
                        $name
                    )));
                }
                Ok(Self(s.to_string()))
            }
        }
    };
}

impl_string_newtype!(TenantId, "TenantId");
impl_string_newtype!(UserId, "UserId");
impl_string_newtype!(RoleId, "RoleId");
