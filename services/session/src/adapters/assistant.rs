//! services/session/src/adapters/assistant.rs
//!
//! The mock cosmic guide. It implements the `AssistantService` port from the
//! `core` crate with a fixed greeting; no model is consulted.

use async_trait::async_trait;
use lemuria_core::domain::ChatMessage;
use lemuria_core::ports::{AssistantService, CoreResult};
use tracing::debug;

/// The first message of every seeded conversation.
pub const WELCOME_MESSAGE: &str = "Welcome to Lemuria! I'm your cosmic guide. Ask me anything about your astrological journey, birth chart, or seek guidance for your path ahead. ✨";

/// The answer given to every question.
pub const CANNED_REPLY: &str = "Hello! 👋 How can I help you with your cosmic journey today?";

#[derive(Clone, Debug)]
pub struct CannedAssistant {
    reply: String,
}

impl CannedAssistant {
    pub fn new() -> Self {
        Self::with_reply(CANNED_REPLY)
    }

    /// An assistant that always answers with `reply`.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for CannedAssistant {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantService for CannedAssistant {
    async fn reply(&self, history: &[ChatMessage], prompt: &str) -> CoreResult<String> {
        debug!(
            history_len = history.len(),
            prompt_len = prompt.len(),
            "Producing canned reply"
        );
        Ok(self.reply.clone())
    }
}
