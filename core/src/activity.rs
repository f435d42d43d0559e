//! Local activity feed.
//!
//! An append-only audit trail of what the user asked for. Entries are never
//! retracted when a mutation rolls back and they outlive the records they
//! describe. Only `clear` removes them.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notify::{Listeners, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Add,
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    Appended(ActivityEntry),
    Cleared,
}

/// Newest-first, unbounded activity log.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    listeners: Listeners<ActivityEvent>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, kind: ActivityKind, message: impl Into<String>) -> &ActivityEntry {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            message: message.into(),
            timestamp: Utc::now(),
            kind,
        };
        self.entries.push_front(entry.clone());
        self.listeners.emit(&ActivityEvent::Appended(entry));
        &self.entries[0]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.listeners.emit(&ActivityEvent::Cleared);
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&ActivityEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&ActivityEvent) + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.unsubscribe(subscription)
    }
}
