//! Route guard controller.
//!
//! One [`RouteGuard`] per guarded subtree. State is published on a `watch`
//! channel, redirects go out as [`GuardEvent`]s. At most one check runs at a
//! time. An overlapping background check is dropped; an overlapping
//! navigation is queued (latest wins) and checked as a navigation as soon as
//! the running check finishes. After [`RouteGuard::unmount`] results of checks
//! still in flight are discarded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use cerbero_auth::AccessReason;

use crate::config::GuardConfig;
use crate::state::{CheckKind, GuardState, settle, start_state};
use crate::transport::GuardTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    /// Navigate to `to`; `from` was denied.
    Redirect {
        from: String,
        to: String,
        reason: Option<AccessReason>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The check ran and its result was applied.
    Applied(GuardState),
    /// Another check was in flight (a navigation is queued behind it), or a
    /// background check found nothing to do.
    Skipped,
    /// The guard was unmounted before the result arrived.
    Discarded,
}

struct Inner<T> {
    transport: T,
    config: GuardConfig,
    state: watch::Sender<GuardState>,
    events: mpsc::UnboundedSender<GuardEvent>,
    /// Last path whose navigation check actually started.
    current_path: Mutex<Option<String>>,
    queued_navigation: Mutex<Option<String>>,
    in_flight: AtomicBool,
    generation: AtomicU64,
    unmounted: AtomicBool,
    shutdown: Notify,
}

/// Cheap to clone; clones share one state machine.
pub struct RouteGuard<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RouteGuard<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Clears the in-flight flag however the check ends.
struct FlightPermit<'a>(&'a AtomicBool);

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T> RouteGuard<T>
where
    T: GuardTransport + 'static,
{
    pub fn new(transport: T, config: GuardConfig) -> (Self, mpsc::UnboundedReceiver<GuardEvent>) {
        let (state, _) = watch::channel(GuardState::InitialChecking);
        let (events, rx) = mpsc::unbounded_channel();
        let guard = Self {
            inner: Arc::new(Inner {
                transport,
                config,
                state,
                events,
                current_path: Mutex::new(None),
                queued_navigation: Mutex::new(None),
                in_flight: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                unmounted: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
        };
        (guard, rx)
    }

    pub fn state(&self) -> GuardState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.inner.state.subscribe()
    }

    pub fn current_path(&self) -> Option<String> {
        self.inner.current_path.lock().ok().and_then(|p| p.clone())
    }

    /// Explicit check for `path` (first mount or navigation). Fails closed.
    ///
    /// Returns `Skipped` when another check is running; the navigation is then
    /// queued and checked right after it.
    pub async fn navigate(&self, path: impl Into<String>) -> CheckOutcome {
        self.run_check(path.into(), CheckKind::Navigation).await
    }

    /// Silent re-check of the current path. Fails open on transport errors.
    pub async fn revalidate(&self) -> CheckOutcome {
        match self.current_path() {
            Some(path) => self.run_check(path, CheckKind::Background).await,
            None => CheckOutcome::Skipped,
        }
    }

    /// Re-check the current path every `revalidate_interval` until unmounted.
    pub fn spawn_background(&self) -> JoinHandle<()> {
        let guard = self.clone();
        let period = self.inner.config.revalidate_interval;

        tokio::spawn(async move {
            tracing::debug!(?period, "guard background revalidation started");

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            while !guard.is_unmounted() {
                tokio::select! {
                    _ = guard.inner.shutdown.notified() => break,
                    _ = ticker.tick() => {
                        if guard.state() != GuardState::Granted {
                            continue;
                        }
                        let outcome = guard.revalidate().await;
                        tracing::trace!(?outcome, "background revalidation");
                    }
                }
            }

            tracing::debug!("guard background revalidation stopped");
        })
    }

    /// Tear the guard down. Pending results are dropped, never applied.
    pub fn unmount(&self) {
        self.inner.unmounted.store(true, Ordering::Release);
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.shutdown.notify_one();
    }

    pub fn is_unmounted(&self) -> bool {
        self.inner.unmounted.load(Ordering::Acquire)
    }

    async fn run_check(&self, path: String, kind: CheckKind) -> CheckOutcome {
        if self.is_unmounted() {
            return CheckOutcome::Discarded;
        }

        let outcome = match self.try_acquire() {
            Some(permit) => self.check_held(permit, path, kind).await,
            None => {
                if kind == CheckKind::Navigation {
                    tracing::debug!(%path, "guard check in flight; queueing navigation");
                    if let Ok(mut queued) = self.inner.queued_navigation.lock() {
                        *queued = Some(path);
                    }
                } else {
                    tracing::debug!(%path, "guard check in flight; skipping background check");
                }
                CheckOutcome::Skipped
            }
        };

        let drained = self.drain_queued().await;
        match outcome {
            CheckOutcome::Skipped if kind == CheckKind::Navigation => drained.unwrap_or(outcome),
            other => other,
        }
    }

    /// Run queued navigations until none is left or another caller holds the
    /// flight permit (that caller drains after its own check).
    async fn drain_queued(&self) -> Option<CheckOutcome> {
        let mut last = None;
        loop {
            if self.is_unmounted() {
                self.take_queued();
                return last;
            }
            let Some(permit) = self.try_acquire() else {
                return last;
            };
            match self.take_queued() {
                Some(path) => last = Some(self.check_held(permit, path, CheckKind::Navigation).await),
                None => {
                    drop(permit);
                    // A navigation may have been queued while we held the permit.
                    if !self.has_queued() {
                        return last;
                    }
                }
            }
        }
    }

    fn try_acquire(&self) -> Option<FlightPermit<'_>> {
        self.inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit(&self.inner.in_flight))
    }

    fn take_queued(&self) -> Option<String> {
        self.inner.queued_navigation.lock().ok().and_then(|mut q| q.take())
    }

    fn has_queued(&self) -> bool {
        self.inner
            .queued_navigation
            .lock()
            .map(|q| q.is_some())
            .unwrap_or(false)
    }

    async fn check_held(&self, _permit: FlightPermit<'_>, path: String, kind: CheckKind) -> CheckOutcome {
        let Some(start) = start_state(self.state(), kind) else {
            return CheckOutcome::Skipped;
        };
        if kind == CheckKind::Navigation {
            if let Ok(mut current) = self.inner.current_path.lock() {
                *current = Some(path.clone());
            }
        }
        let generation = self.inner.generation.load(Ordering::Acquire);
        self.inner.state.send_if_modified(|s| {
            let changed = *s != start;
            *s = start;
            changed
        });

        let result = self.inner.transport.check(&path).await;

        if self.inner.generation.load(Ordering::Acquire) != generation {
            tracing::debug!(%path, "guard unmounted during check; discarding result");
            return CheckOutcome::Discarded;
        }

        if let Err(e) = &result {
            match kind {
                CheckKind::Navigation => tracing::warn!(%path, error = %e, "guard check failed; denying"),
                CheckKind::Background => tracing::debug!(%path, error = %e, "background check failed; keeping access"),
            }
        }

        let transition = settle(kind, &result);
        self.inner.state.send_if_modified(|s| {
            let changed = *s != transition.next;
            *s = transition.next;
            changed
        });

        if transition.redirect {
            let reason = result.as_ref().ok().map(|d| d.reason);
            tracing::info!(%path, ?reason, to = %self.inner.config.denied_path, "route access denied");
            let _ = self.inner.events.send(GuardEvent::Redirect {
                from: path,
                to: self.inner.config.denied_path.clone(),
                reason,
            });
        }

        CheckOutcome::Applied(transition.next)
    }
}
