use cryptoguard_core::db::{open_db, open_db_in_memory};
use cryptoguard_core::{
    FixedClock, KvRepository, MemoryKvRepository, NotificationDraft, NotificationId,
    NotificationStore, Severity, SqliteKvRepository, MAX_SAFE_ID,
};
use std::collections::HashSet;

const LEGACY_LIST: &str = r#"[
    {"id":1712345678999.731,"title":"Medium exposure","message":"ETH 40%","time":"9:15:00 AM","read":false},
    {"id":1712345678901.25,"title":"Asset added","message":"BTC","time":"9:14:00 AM","read":true}
]"#;

fn fixed_store(repo: &MemoryKvRepository) -> NotificationStore<&MemoryKvRepository, FixedClock> {
    NotificationStore::with_clock(repo, FixedClock::new(1_700_000_000_000, "3:04:05 PM"))
}

#[test]
fn notify_prepends_and_counts_every_call() {
    let repo = MemoryKvRepository::new();
    let mut store = fixed_store(&repo);
    store.load();

    for index in 0..25 {
        store.notify_text(&format!("Event {index}"), "body");
    }

    let titles: Vec<String> = store.entries().iter().map(|e| e.title.clone()).collect();
    let expected: Vec<String> = (0..25).rev().map(|index| format!("Event {index}")).collect();
    assert_eq!(titles, expected);
}

#[test]
fn same_millisecond_ids_never_collide() {
    let repo = MemoryKvRepository::new();
    let mut store = fixed_store(&repo);

    let ids: Vec<NotificationId> = (0..1_100)
        .map(|_| store.notify_text("Burst", "same instant"))
        .collect();

    let distinct: HashSet<u64> = ids.iter().map(|id| id.value().to_bits()).collect();
    assert_eq!(distinct.len(), ids.len());
    assert_eq!(store.entries().len(), ids.len());
    assert!(ids.windows(2).all(|pair| pair[1] > pair[0]));
}

#[test]
fn high_risk_scenario_marks_read() {
    let repo = MemoryKvRepository::new();
    let mut store = fixed_store(&repo);
    store.load();

    let id = store.notify(NotificationDraft::new("High risk detected", "Token X"));

    let entry = store.get(id).unwrap();
    assert!(!entry.read);
    assert_eq!(entry.severity(), Severity::High);
    assert_eq!(entry.severity().color_name(), "red");
    assert_eq!(entry.time, "3:04:05 PM");

    assert!(store.mark_as_read(id));
    assert!(store.get(id).unwrap().read);
}

#[test]
fn explicit_severity_wins_over_title() {
    let repo = MemoryKvRepository::new();
    let mut store = fixed_store(&repo);

    let id = store.notify(NotificationDraft::new("High volume", "ok").with_severity(Severity::Low));

    assert_eq!(store.get(id).unwrap().severity, Some(Severity::Low));
}

#[test]
fn mark_as_read_then_mark_all_is_idempotent() {
    let repo = MemoryKvRepository::new();
    let mut store = fixed_store(&repo);
    let first = store.notify_text("Low balance", "a");
    store.notify_text("Medium exposure", "b");
    store.notify_text("High risk", "c");

    store.mark_as_read(first);
    store.mark_all_as_read();
    let once = store.entries().to_vec();
    let persisted_once = repo.get("notifications").unwrap();

    store.mark_all_as_read();

    assert!(store.entries().iter().all(|entry| entry.read));
    assert_eq!(store.entries(), once.as_slice());
    assert_eq!(repo.get("notifications").unwrap(), persisted_once);
    assert_eq!(store.unread_count(), 0);
}

#[test]
fn clear_all_removes_key_and_reload_is_empty() {
    let repo = SqliteKvRepository::new(open_db_in_memory().unwrap());
    let mut store = NotificationStore::new(&repo);
    store.notify_text("High risk", "a");
    store.notify_text("Asset added", "b");

    store.clear_all();

    assert!(store.entries().is_empty());
    assert_eq!(repo.get("notifications").unwrap(), None);

    let mut reloaded = NotificationStore::new(&repo);
    assert!(reloaded.load().is_empty());
}

#[test]
fn repeated_load_does_not_duplicate_entries() {
    let repo = MemoryKvRepository::new();
    repo.set("notifications", LEGACY_LIST).unwrap();
    let mut store = fixed_store(&repo);

    assert_eq!(store.load().len(), 2);
    assert_eq!(store.load().len(), 2);
    store.load();

    assert_eq!(store.entries().len(), 2);
}

#[test]
fn legacy_entries_load_and_classify_by_keyword() {
    let repo = MemoryKvRepository::new();
    repo.set("notifications", LEGACY_LIST).unwrap();
    let mut store = fixed_store(&repo);
    store.load();

    let first = &store.entries()[0];
    assert_eq!(first.id, NotificationId::from_raw(1712345678999.731));
    assert_eq!(first.severity, None);
    assert_eq!(first.severity(), Severity::Medium);
    assert_eq!(store.unread_count(), 1);

    assert!(store.mark_as_read(NotificationId::from_raw(1712345678999.731)));
    assert_eq!(store.unread_count(), 0);
}

#[test]
fn new_ids_sort_after_legacy_ids() {
    let repo = MemoryKvRepository::new();
    repo.set("notifications", LEGACY_LIST).unwrap();
    let mut store = NotificationStore::with_clock(&repo, FixedClock::new(0, "12:00:00 AM"));

    let id = store.notify_text("Asset removed", "SOL");

    assert!(id > NotificationId::from_raw(1712345678999.731));
}

#[test]
fn oversized_persisted_id_does_not_collide_with_new_ids() {
    let repo = MemoryKvRepository::new();
    repo.set(
        "notifications",
        r#"[{"id":1e16,"title":"Imported","message":"m","time":"1:00:00 AM","read":false}]"#,
    )
    .unwrap();
    let mut store = fixed_store(&repo);

    let first = store.notify_text("Asset added", "BTC");
    let second = store.notify_text("Asset added", "ETH");

    let ids: Vec<u64> = store.entries().iter().map(|e| e.id.value().to_bits()).collect();
    let distinct: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(distinct.len(), 3);
    assert!(second > first);
    assert!(second.value() <= MAX_SAFE_ID as f64);
}

#[test]
fn huge_persisted_id_is_not_fatal() {
    let repo = MemoryKvRepository::new();
    repo.set(
        "notifications",
        r#"[{"id":1e300,"title":"Imported","message":"m","time":"1:00:00 AM","read":true}]"#,
    )
    .unwrap();
    let mut store = fixed_store(&repo);

    let id = store.notify_text("High risk", "Token X");

    assert_eq!(store.entries().len(), 2);
    assert_eq!(store.entries()[0].id, id);
    assert_eq!(id.value().fract(), 0.0);
    assert!(id.value() <= MAX_SAFE_ID as f64);
}

#[test]
fn malformed_persisted_list_loads_empty_and_is_overwritten() {
    let repo = MemoryKvRepository::new();
    repo.set("notifications", "[{broken").unwrap();
    let mut store = fixed_store(&repo);

    assert!(store.load().is_empty());
    store.notify_text("Asset added", "BTC");

    let raw = repo.get("notifications").unwrap().unwrap();
    let persisted: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted.as_array().unwrap().len(), 1);
}

#[test]
fn persisted_shape_matches_web_layout() {
    let repo = MemoryKvRepository::new();
    let mut store = fixed_store(&repo);
    store.notify_text("High risk detected", "Token X");

    let raw = repo.get("notifications").unwrap().unwrap();
    let persisted: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &persisted[0];
    assert!(entry["id"].is_number());
    assert_eq!(entry["title"], "High risk detected");
    assert_eq!(entry["message"], "Token X");
    assert_eq!(entry["time"], "3:04:05 PM");
    assert_eq!(entry["read"], false);
    assert_eq!(entry["severity"], "high");
}

#[test]
fn rejected_writes_keep_in_memory_state_authoritative() {
    let repo = MemoryKvRepository::new();
    let mut store = fixed_store(&repo);
    store.load();
    repo.set_reject_writes(true);

    let id = store.notify_text("High risk", "quota exceeded");
    store.mark_as_read(id);

    assert_eq!(store.entries().len(), 1);
    assert!(store.get(id).unwrap().read);
    assert_eq!(repo.get("notifications").unwrap(), None);
}

#[test]
fn list_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cryptoguard.db");

    {
        let repo = SqliteKvRepository::new(open_db(&path).unwrap());
        let mut store = NotificationStore::new(repo);
        store.notify_text("Asset added", "BTC");
        store.notify_text("High risk", "ETH");
    }

    let repo = SqliteKvRepository::new(open_db(&path).unwrap());
    let mut store = NotificationStore::new(repo);
    let titles: Vec<&str> = store.load().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["High risk", "Asset added"]);
}
