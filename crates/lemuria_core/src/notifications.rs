//! crates/lemuria_core/src/notifications.rs
//!
//! The working set of visible notifications. Removal is by id only, so a manual
//! dismissal and an expiry racing for the same entry can't remove a neighbour.

use crate::domain::{Notification, Severity};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    entries: IndexMap<Uuid, Notification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a notification with a fresh id and returns that id.
    pub fn enqueue(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
        severity: Severity,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            Notification {
                id,
                title: title.into(),
                description,
                severity,
                created_at,
            },
        );
        id
    }

    /// Removes the notification if it is still present. Returns whether anything was removed.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        self.entries.shift_remove(&id).is_some()
    }

    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.values()
    }

    /// Current notifications in display (insertion) order.
    pub fn list(&self) -> Vec<Notification> {
        self.entries.values().cloned().collect()
    }
}
