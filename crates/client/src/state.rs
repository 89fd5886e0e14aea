//! Guard states and the pure transition rules between them.
//!
//! Explicit (navigation) checks fail closed: a transport error denies.
//! Silent background checks fail open: a transport error keeps `Granted`,
//! only an explicit deny from the server ejects the user.

use serde::Serialize;

use cerbero_auth::AccessDecision;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    /// Nothing granted yet; the guarded UI is not mounted.
    InitialChecking,
    Granted,
    Denied,
    /// Re-checking after navigation; the UI stays mounted under an overlay.
    Revalidating,
}

impl GuardState {
    /// Whether the guarded UI is mounted in this state.
    pub fn renders_content(self) -> bool {
        matches!(self, GuardState::Granted | GuardState::Revalidating)
    }

    pub fn shows_overlay(self) -> bool {
        self == GuardState::Revalidating
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// Triggered by navigation or first mount.
    Navigation,
    /// Periodic silent re-check.
    Background,
}

/// State to enter when a check starts, or `None` if it must not start.
///
/// Background checks only run while `Granted` and do not change the state.
pub fn start_state(current: GuardState, kind: CheckKind) -> Option<GuardState> {
    match kind {
        CheckKind::Navigation if current.renders_content() => Some(GuardState::Revalidating),
        CheckKind::Navigation => Some(GuardState::InitialChecking),
        CheckKind::Background if current == GuardState::Granted => Some(GuardState::Granted),
        CheckKind::Background => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: GuardState,
    /// Send the user to the access-denied destination.
    pub redirect: bool,
}

/// Settle a finished check.
pub fn settle(kind: CheckKind, result: &Result<AccessDecision, TransportError>) -> Transition {
    let denied = Transition {
        next: GuardState::Denied,
        redirect: true,
    };
    match (kind, result) {
        (_, Ok(decision)) if decision.has_access => Transition {
            next: GuardState::Granted,
            redirect: false,
        },
        (_, Ok(_)) => denied,
        (CheckKind::Navigation, Err(_)) => denied,
        (CheckKind::Background, Err(_)) => Transition {
            next: GuardState::Granted,
            redirect: false,
        },
    }
}
