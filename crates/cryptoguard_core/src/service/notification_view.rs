//! Read models for the notification bell and panel.
//!
//! Both consumers read the shared [`NotificationStore`]; neither keeps a copy
//! of the list.

use crate::model::notification::{NotificationId, Severity};
use crate::repo::kv_repo::KvRepository;
use crate::service::clock::Clock;
use crate::service::notification_service::NotificationStore;

/// Text the panel shows when the list is empty.
pub const EMPTY_PANEL_TEXT: &str = "No notifications";

/// Bell indicator state: only panel visibility is local.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationBell {
    open: bool,
}

impl NotificationBell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Click handler; returns the new visibility.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Badge value; `None` hides the badge.
    pub fn badge<R: KvRepository, C: Clock>(&self, store: &NotificationStore<R, C>) -> Option<usize> {
        match store.unread_count() {
            0 => None,
            count => Some(count),
        }
    }
}

/// One rendered panel row.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelItem {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub time: String,
    pub read: bool,
    pub severity: Severity,
    /// Accent color for the title and left border.
    pub color: &'static str,
}

/// Rows for the dropdown panel, newest first.
pub fn panel_items<R: KvRepository, C: Clock>(store: &NotificationStore<R, C>) -> Vec<PanelItem> {
    store
        .entries()
        .iter()
        .map(|entry| {
            let severity = entry.severity();
            PanelItem {
                id: entry.id,
                title: entry.title.clone(),
                message: entry.message.clone(),
                time: entry.time.clone(),
                read: entry.read,
                severity,
                color: severity.color(),
            }
        })
        .collect()
}
