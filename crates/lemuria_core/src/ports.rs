//! crates/lemuria_core/src/ports.rs
//!
//! Defines the error type of the core and the service contracts (traits) the core
//! depends on. Time and the assistant's replies come from outside the core so that
//! hosts can swap in real timers, mocks, or a paused test clock.

use crate::domain::ChatMessage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

//=========================================================================================
// Core Error and Result Types
//=========================================================================================

/// Every recoverable condition the core can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("The {kind} {id} is protected and cannot be removed")]
    ProtectedEntity { kind: &'static str, id: Uuid },
    #[error("Item not found: {kind} {id}")]
    NotFound { kind: &'static str, id: Uuid },
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Source of wall-clock timestamps and delayed completions.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// The timestamp recorded on newly created entities.
    fn now(&self) -> DateTime<Utc>;

    /// Resolves once `delay` has elapsed on this scheduler's clock.
    async fn sleep(&self, delay: Duration);
}

#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Produces the assistant's answer to `prompt`, given the conversation so far.
    async fn reply(&self, history: &[ChatMessage], prompt: &str) -> CoreResult<String>;
}
