//! Notification store.
//!
//! # Responsibility
//! - Own the process-wide, newest-first notification list.
//! - Mirror every mutation to the persisted `notifications` key.
//!
//! # Invariants
//! - The persisted list is loaded at most once per store instance.
//! - New entries are prepended; order is never rearranged afterwards.
//! - `clear_all` deletes the key itself, never leaves an empty array behind.
//! - Persistence is best effort; in-memory state stays authoritative.

use crate::model::notification::{IdGenerator, NotificationDraft, NotificationEntry, NotificationId};
use crate::repo::keys;
use crate::repo::kv_repo::KvRepository;
use crate::service::clock::{Clock, SystemClock};
use log::{debug, info, warn};

/// Persisted notification list shared by every UI consumer.
///
/// Construct one per process and hand out references; a second instance over
/// the same repository would drift from the first.
pub struct NotificationStore<R: KvRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    entries: Vec<NotificationEntry>,
    ids: IdGenerator,
    loaded: bool,
}

impl<R: KvRepository> NotificationStore<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: KvRepository, C: Clock> NotificationStore<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            entries: Vec::new(),
            ids: IdGenerator::new(),
            loaded: false,
        }
    }

    /// Loads the persisted list on first call; later calls are no-ops.
    ///
    /// Absent, malformed or unreadable data loads as an empty list.
    pub fn load(&mut self) -> &[NotificationEntry] {
        if self.loaded {
            debug!("event=notifications_load module=notification status=skipped reason=already_loaded");
            return &self.entries;
        }
        self.loaded = true;

        let persisted = self.read_persisted();
        for entry in &persisted {
            if !self.ids.observe(entry.id) {
                warn!(
                    "event=notifications_load module=notification status=fallback error_code=id_out_of_range id={}",
                    entry.id
                );
            }
        }
        info!(
            "event=notifications_load module=notification status=ok count={}",
            persisted.len()
        );
        self.entries = persisted;
        &self.entries
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Current list, newest first.
    pub fn entries(&self) -> &[NotificationEntry] {
        &self.entries
    }

    pub fn get(&self, id: NotificationId) -> Option<&NotificationEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.read).count()
    }

    /// Creates an entry from `draft`, prepends it and persists the list.
    pub fn notify(&mut self, draft: NotificationDraft) -> NotificationId {
        self.load();

        let id = self.ids.next_id(self.clock.now_epoch_ms());
        let entry = NotificationEntry::from_draft(id, self.clock.time_label(), draft);
        debug!(
            "event=notification_add module=notification status=ok severity={}",
            entry.severity().as_str()
        );
        self.entries.insert(0, entry);
        self.persist();
        id
    }

    /// Shorthand for `notify(NotificationDraft::new(title, message))`.
    pub fn notify_text(&mut self, title: &str, message: &str) -> NotificationId {
        self.notify(NotificationDraft::new(title, message))
    }

    /// Marks the matching entry read. Unknown ids are ignored.
    ///
    /// Returns whether an entry changed.
    pub fn mark_as_read(&mut self, id: NotificationId) -> bool {
        self.load();

        let changed = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .is_some_and(NotificationEntry::mark_read);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn mark_all_as_read(&mut self) {
        self.load();

        let changed = self
            .entries
            .iter_mut()
            .fold(0usize, |count, entry| count + usize::from(entry.mark_read()));
        if changed > 0 {
            self.persist();
        }
        debug!("event=notifications_mark_all module=notification status=ok changed={changed}");
    }

    /// Empties the list and deletes the persisted key.
    pub fn clear_all(&mut self) {
        self.loaded = true;
        let removed = self.entries.len();
        self.entries.clear();

        match self.repo.remove(keys::NOTIFICATIONS) {
            Ok(()) => info!("event=notifications_clear module=notification status=ok removed={removed}"),
            Err(err) => warn!(
                "event=notifications_clear module=notification status=error error_code=persist_failed error={}",
                err
            ),
        }
    }

    fn read_persisted(&self) -> Vec<NotificationEntry> {
        let raw = match self.repo.get(keys::NOTIFICATIONS) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(
                    "event=notifications_load module=notification status=fallback error_code=read_failed error={}",
                    err
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Option<Vec<NotificationEntry>>>(&raw) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(err) => {
                warn!(
                    "event=notifications_load module=notification status=fallback error_code=malformed_json error={}",
                    err
                );
                Vec::new()
            }
        }
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.entries) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    "event=notifications_persist module=notification status=error error_code=encode_failed error={}",
                    err
                );
                return;
            }
        };

        if let Err(err) = self.repo.set(keys::NOTIFICATIONS, &raw) {
            warn!(
                "event=notifications_persist module=notification status=error error_code=persist_failed count={} error={}",
                self.entries.len(),
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NotificationStore;
    use crate::repo::kv_repo::{KvRepository, MemoryKvRepository};
    use crate::service::clock::FixedClock;

    #[test]
    fn mutation_before_explicit_load_keeps_persisted_entries() {
        let repo = MemoryKvRepository::new();
        repo.set(
            "notifications",
            r#"[{"id":1.5,"title":"Old","message":"m","time":"t","read":false}]"#,
        )
        .unwrap();

        let mut store = NotificationStore::with_clock(&repo, FixedClock::new(10, "t"));
        store.notify_text("New", "m");

        assert!(store.is_loaded());
        let titles: Vec<&str> = store.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[test]
    fn mark_as_read_on_unknown_id_does_not_write() {
        let repo = MemoryKvRepository::new();
        let mut store = NotificationStore::with_clock(&repo, FixedClock::new(10, "t"));
        store.load();

        assert!(!store.mark_as_read(crate::NotificationId::from_raw(7.0)));
        assert!(repo.get("notifications").unwrap().is_none());
    }
}
