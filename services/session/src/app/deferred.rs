//! services/session/src/app/deferred.rs
//!
//! Simulated asynchronous operations. A `Deferred` waits on the session's
//! scheduler and then runs its completion, unless its token is cancelled first.

use crate::error::{SessionError, SessionResult};
use lemuria_core::ports::Scheduler;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a deferred operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredOutcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> DeferredOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            DeferredOutcome::Completed(value) => Some(value),
            DeferredOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeferredOutcome::Cancelled)
    }
}

/// Handle to a pending completion.
#[derive(Debug)]
pub struct Deferred<T> {
    handle: JoinHandle<DeferredOutcome<T>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Runs `complete` after `delay`. The operation's token is a child of `parent`,
    /// so cancelling the owning scope cancels this operation too.
    ///
    /// `complete` returns `None` when it finds its scope gone at commit time;
    /// that is reported as `Cancelled`.
    pub fn spawn<F, Fut>(
        scheduler: Arc<dyn Scheduler>,
        delay: Duration,
        parent: &CancellationToken,
        complete: F,
    ) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        let task_token = parent.child_token();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    debug!("Deferred operation cancelled while waiting");
                    return DeferredOutcome::Cancelled;
                }
                _ = scheduler.sleep(delay) => {}
            }
            match complete(task_token).await {
                Some(value) => DeferredOutcome::Completed(value),
                None => DeferredOutcome::Cancelled,
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the operation to complete or be cancelled.
    pub async fn wait(self) -> SessionResult<DeferredOutcome<T>> {
        self.handle
            .await
            .map_err(|e| SessionError::Internal(format!("deferred task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::TokioScheduler;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn scheduler() -> Arc<dyn Scheduler> {
        Arc::new(TokioScheduler::new())
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_the_delay() {
        let root = CancellationToken::new();
        let start = tokio::time::Instant::now();
        let deferred = Deferred::spawn(scheduler(), Duration::from_millis(1000), &root, |_| async {
            Some(42)
        });
        assert_eq!(deferred.wait().await.unwrap(), DeferredOutcome::Completed(42));
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_firing_never_runs() {
        let scope = CancellationToken::new();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let deferred = Deferred::spawn(scheduler(), Duration::from_millis(1000), &scope, move |_| async move {
            flag.store(true, Ordering::SeqCst);
            Some(())
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        scope.cancel();
        assert!(deferred.wait().await.unwrap().is_cancelled());
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_propagates() {
        let root = CancellationToken::new();
        let deferred = Deferred::spawn(scheduler(), Duration::from_secs(5), &root, |_| async {
            Some("done")
        });
        root.cancel();
        assert_eq!(deferred.wait().await.unwrap(), DeferredOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_one_scope_leaves_siblings_alone() {
        let root = CancellationToken::new();
        let torn_down = root.child_token();
        let mounted = root.child_token();
        let first = Deferred::spawn(scheduler(), Duration::from_millis(10), &torn_down, |_| async {
            Some(1)
        });
        let second = Deferred::spawn(scheduler(), Duration::from_millis(10), &mounted, |_| async {
            Some(2)
        });
        torn_down.cancel();
        assert!(first.wait().await.unwrap().is_cancelled());
        assert_eq!(second.wait().await.unwrap().completed(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_can_discard_its_effects() {
        let root = CancellationToken::new();
        let deferred: Deferred<()> =
            Deferred::spawn(scheduler(), Duration::from_millis(10), &root, |_| async { None });
        assert!(deferred.wait().await.unwrap().is_cancelled());
    }
}
