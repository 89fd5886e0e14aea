//! Client-side route guard.
//!
//! Drives a [`GuardState`] machine from navigation and a silent background
//! timer, asking the server's `/api/access/check` for every decision.

pub mod config;
pub mod error;
pub mod guard;
pub mod state;
pub mod transport;

pub use config::GuardConfig;
pub use error::{ConfigError, TransportError};
pub use guard::{CheckOutcome, GuardEvent, RouteGuard};
pub use state::{CheckKind, GuardState, Transition};
pub use transport::{GuardTransport, HttpGuardTransport};
