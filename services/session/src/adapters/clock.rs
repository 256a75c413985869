//! services/session/src/adapters/clock.rs
//!
//! The production `Scheduler`: wall-clock timestamps and tokio timers. Under a
//! paused tokio clock (`start_paused` tests) the timers advance deterministically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lemuria_core::ports::Scheduler;
use std::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
