//! `cerbero-core` — identifiers and error model shared by every layer.
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, TenantOwned};
pub use error::{DomainError, DomainResult};
pub use id::{RoleId, TenantId, UserId};
