//! services/session/src/app/toaster.rs
//!
//! Raises notifications and expires them. Expiry and manual dismissal share the
//! same idempotent removal by id, so whichever runs second is a no-op.

use crate::app::state::SessionState;
use lemuria_core::domain::Severity;
use lemuria_core::ports::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct Toaster {
    state: Arc<Mutex<SessionState>>,
    scheduler: Arc<dyn Scheduler>,
    ttl: Duration,
    token: CancellationToken,
}

impl Toaster {
    pub(crate) fn new(
        state: Arc<Mutex<SessionState>>,
        scheduler: Arc<dyn Scheduler>,
        ttl: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            state,
            scheduler,
            ttl,
            token,
        }
    }

    /// Enqueues into state the caller already holds and arms the expiry timer.
    pub fn push(
        &self,
        state: &mut SessionState,
        title: &str,
        description: Option<String>,
        severity: Severity,
    ) -> Uuid {
        let id = state
            .notifications
            .enqueue(title, description, severity, self.scheduler.now());
        info!(%id, title, ?severity, "Notification raised");
        self.arm_expiry(id);
        id
    }

    /// Manual dismissal. Returns whether the notification was still showing.
    pub async fn dismiss(&self, id: Uuid) -> bool {
        let removed = self.state.lock().await.notifications.dismiss(id);
        debug!(%id, removed, "Notification dismissed");
        removed
    }

    fn arm_expiry(&self, id: Uuid) {
        let state = self.state.clone();
        let scheduler = self.scheduler.clone();
        let token = self.token.clone();
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = scheduler.sleep(ttl) => {}
            }
            if state.lock().await.notifications.dismiss(id) {
                debug!(%id, "Notification expired");
            }
        });
    }
}
