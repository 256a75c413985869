//! services/session/src/app/chat.rs
//!
//! The chat assistant view and the helpers a renderer uses to lay out the log.

use crate::app::deferred::Deferred;
use crate::app::state::{Session, ViewScope};
use chrono::{DateTime, NaiveDate, Utc};
use lemuria_core::domain::ChatMessage;
use lemuria_core::ports::CoreResult;
use lemuria_core::store::MessageFlag;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Messages longer than this many lines render collapsed until expanded.
pub const TRUNCATE_AFTER_LINES: usize = 20;

pub struct ChatView {
    session: Session,
    scope: ViewScope,
}

impl ChatView {
    pub async fn mount(session: Session) -> Self {
        session.lock().await.awaiting_reply = false;
        let scope = session.scope();
        Self { session, scope }
    }

    pub fn unmount(self) {
        self.scope.teardown();
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.session.lock().await.messages.list()
    }

    /// Appends the user's message and schedules the assistant's reply.
    ///
    /// Blank input, or input sent while a reply is pending, is ignored.
    pub async fn send(&self, input: &str) -> Option<Deferred<CoreResult<ChatMessage>>> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return None;
        }

        let history = {
            let mut state = self.session.lock().await;
            if state.awaiting_reply {
                debug!("Message ignored; a reply is still pending");
                return None;
            }
            let message = ChatMessage::new(prompt, true, self.session.scheduler.now());
            let id = state.messages.append(message).id;
            info!(%id, "User message sent");
            state.awaiting_reply = true;
            state.messages.list()
        };

        let session = self.session.clone();
        let prompt = prompt.to_string();
        let delay = self.reply_delay();
        Some(Deferred::spawn(
            self.session.scheduler.clone(),
            delay,
            self.scope.token(),
            move |token| async move {
                let reply = session.assistant.reply(&history, &prompt).await;
                let now = session.scheduler.now();
                session
                    .commit(&token, move |state| {
                        state.awaiting_reply = false;
                        match reply {
                            Ok(text) => {
                                let stored = state
                                    .messages
                                    .append(ChatMessage::new(text, false, now))
                                    .clone();
                                info!(id = %stored.id, "Assistant replied");
                                Ok(stored)
                            }
                            Err(err) => {
                                error!("Assistant failed to reply: {:?}", err);
                                Err(err)
                            }
                        }
                    })
                    .await
            },
        ))
    }

    /// Expands or collapses a long message. A message that no longer exists is ignored.
    pub async fn toggle_expanded(&self, id: Uuid) -> bool {
        let toggled = self
            .session
            .lock()
            .await
            .messages
            .toggle_field(id, MessageFlag::Expanded);
        if !toggled {
            debug!(%id, "Toggle ignored for a missing message");
        }
        toggled
    }

    fn reply_delay(&self) -> Duration {
        let config = &self.session.config;
        let min = config.reply_delay_min.as_millis() as u64;
        let max = config.reply_delay_max.as_millis() as u64;
        if min >= max {
            return config.reply_delay_min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

//=========================================================================================
// Rendering Helpers
//=========================================================================================

/// What a renderer shows for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePreview {
    pub text: String,
    /// Lines hidden behind "Read More"; zero when the whole message is shown.
    pub hidden_lines: usize,
    /// Whether a "Show Less" control applies.
    pub collapsible: bool,
}

pub fn preview(message: &ChatMessage) -> MessagePreview {
    let lines: Vec<&str> = message.content.split('\n').collect();
    let long = lines.len() > TRUNCATE_AFTER_LINES;
    if long && !message.is_expanded {
        MessagePreview {
            text: lines[..TRUNCATE_AFTER_LINES].join("\n"),
            hidden_lines: lines.len() - TRUNCATE_AFTER_LINES,
            collapsible: false,
        }
    } else {
        MessagePreview {
            text: message.content.clone(),
            hidden_lines: 0,
            collapsible: long,
        }
    }
}

/// A separator goes before the first message and wherever the calendar day changes.
pub fn needs_date_separator(current: &ChatMessage, previous: Option<&ChatMessage>) -> bool {
    match previous {
        None => true,
        Some(prev) => prev.timestamp.date_naive() != current.timestamp.date_naive(),
    }
}

/// "Today", "Yesterday", or e.g. "Monday, January 1, 2024".
pub fn date_label(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let day = timestamp.date_naive();
    let today = now.date_naive();
    if day == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else {
        full_date(day)
    }
}

fn full_date(day: NaiveDate) -> String {
    day.format("%A, %B %-d, %Y").to_string()
}
