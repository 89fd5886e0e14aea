//! Ambient tenant/user context.
//!
//! Each inbound request runs inside [`run_with_context`], and any code it
//! calls (however deep, across any number of `.await` points) can read the
//! context back without it being threaded through parameters.
//!
//! Storage is a tokio task-local, so two requests executing concurrently on
//! the same runtime (even the same worker thread) never observe each other's
//! context. There is no process-wide value: outside a scope the context is
//! simply unset.

use std::future::Future;

use serde::Serialize;
use tokio::task::JoinHandle;

use cerbero_auth::Session;
use cerbero_core::{TenantId, UserId};

tokio::task_local! {
    static CURRENT: TenantContext;
}

/// The `{tenantId, userId}` pair bound to one request/operation.
///
/// `tenant_id = None` means "no tenant filter": either a super-admin in the
/// global scope or an operation with no tenant at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContext {
    pub tenant_id: Option<TenantId>,
    pub user_id: Option<UserId>,
}

impl TenantContext {
    pub fn new(tenant_id: Option<TenantId>, user_id: Option<UserId>) -> Self {
        Self { tenant_id, user_id }
    }

    pub fn for_tenant(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            user_id: Some(user_id),
        }
    }

    pub fn from_session(session: &Session) -> Self {
        Self {
            tenant_id: session.active_tenant_id().cloned(),
            user_id: Some(session.user_id().clone()),
        }
    }
}

/// Run `fut` with `ctx` as the ambient context for its whole lifetime.
///
/// Nested calls shadow the outer context for their own duration only.
pub async fn run_with_context<F>(ctx: TenantContext, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(ctx, fut).await
}

/// Synchronous variant of [`run_with_context`].
pub fn run_with_context_sync<R>(ctx: TenantContext, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(ctx, f)
}

/// The active context, or `None` outside any scope.
pub fn get_context() -> Option<TenantContext> {
    CURRENT.try_with(Clone::clone).ok()
}

pub fn current_tenant_id() -> Option<TenantId> {
    CURRENT.try_with(|c| c.tenant_id.clone()).ok().flatten()
}

pub fn current_user_id() -> Option<UserId> {
    CURRENT.try_with(|c| c.user_id.clone()).ok().flatten()
}

/// `tokio::spawn` that carries the caller's context into the new task.
///
/// Task-locals do not cross `spawn`; background work started from a request
/// must use this (or open its own scope) to stay tenant-scoped.
pub fn spawn_with_context<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match get_context() {
        Some(ctx) => tokio::spawn(CURRENT.scope(ctx, fut)),
        None => tokio::spawn(fut),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn ctx(tenant: &str, user: &str) -> TenantContext {
        TenantContext::for_tenant(TenantId::from_raw(tenant), UserId::from_raw(user))
    }

    #[test]
    fn unset_outside_any_scope() {
        assert_eq!(get_context(), None);
        assert_eq!(current_tenant_id(), None);
        assert_eq!(current_user_id(), None);
    }

    #[test]
    fn sync_scope_is_visible_inside_only() {
        let seen = run_with_context_sync(ctx("T1", "u1"), current_tenant_id);
        assert_eq!(seen, Some(TenantId::from_raw("T1")));
        assert_eq!(current_tenant_id(), None);
    }

    #[tokio::test]
    async fn nested_scope_shadows_then_restores() {
        run_with_context(ctx("outer", "u1"), async {
            assert_eq!(current_tenant_id(), Some(TenantId::from_raw("outer")));

            run_with_context(TenantContext::new(None, Some(UserId::from_raw("root"))), async {
                assert_eq!(current_tenant_id(), None);
                assert_eq!(current_user_id(), Some(UserId::from_raw("root")));
            })
            .await;

            assert_eq!(current_tenant_id(), Some(TenantId::from_raw("outer")));
            assert_eq!(current_user_id(), Some(UserId::from_raw("u1")));
        })
        .await;

        assert_eq!(get_context(), None);
    }

    async fn observe_for(rounds: usize) -> Vec<Option<TenantId>> {
        let mut seen = Vec::with_capacity(rounds);
        for i in 0..rounds {
            seen.push(current_tenant_id());
            if i % 2 == 0 {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }
        seen
    }

    #[tokio::test]
    async fn interleaved_chains_only_see_their_own_tenant() {
        let a = run_with_context(ctx("A", "ua"), observe_for(20));
        let b = run_with_context(ctx("B", "ub"), observe_for(20));
        let (seen_a, seen_b) = tokio::join!(a, b);

        assert!(seen_a.iter().all(|t| t.as_ref().map(TenantId::as_str) == Some("A")));
        assert!(seen_b.iter().all(|t| t.as_ref().map(TenantId::as_str) == Some("B")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_across_threads_are_isolated() {
        let mut handles = Vec::new();
        for i in 0..32 {
            let tenant = format!("T{i}");
            handles.push(tokio::spawn(run_with_context(
                TenantContext::for_tenant(TenantId::from_raw(tenant.clone()), UserId::from_raw("u")),
                async move {
                    for _ in 0..10 {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                        assert_eq!(current_tenant_id().map(String::from), Some(tenant.clone()));
                    }
                },
            )));
        }
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn plain_spawn_drops_context_but_spawn_with_context_keeps_it() {
        run_with_context(ctx("T1", "u1"), async {
            let plain = tokio::spawn(async { current_tenant_id() }).await.unwrap();
            assert_eq!(plain, None);

            let carried = spawn_with_context(async { current_tenant_id() }).await.unwrap();
            assert_eq!(carried, Some(TenantId::from_raw("T1")));
        })
        .await;
    }

    #[test]
    fn context_from_session() {
        let session = Session::new(
            UserId::from_raw("u1"),
            vec![],
            "tok",
            Some(TenantId::from_raw("T1")),
        );
        assert_eq!(TenantContext::from_session(&session), ctx("T1", "u1"));
    }
}
