//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose session and notification use-cases to Dart via FRB.
//! - Own the single process-wide notification provider.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every caller shares one `NotificationStore`; none builds its own.
//! - Failures surface as UTF-8 messages, never as panics.

use cryptoguard_core::db::{open_db, open_db_in_memory};
use cryptoguard_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, panel_items,
    ping as ping_inner, FavouriteAsset, NotificationDraft, NotificationId, NotificationStore,
    RouteAccess, SessionStore, Severity, SqliteKvRepository,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

const STATE_DB_FILE_NAME: &str = "cryptoguard_state.sqlite3";
static STATE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static NOTIFICATION_PROVIDER: Mutex<Option<NotificationStore<SqliteKvRepository>>> =
    Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Top-bar identity with display fallbacks applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityView {
    pub authenticated: bool,
    pub name: String,
    pub email: String,
    pub avatar_url: String,
    pub address: Option<String>,
}

/// Route guard decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub allowed: bool,
    /// Target route when `allowed` is false.
    pub redirect_to: Option<String>,
}

/// Watchlist row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavouriteItem {
    pub symbol: String,
    pub name: Option<String>,
}

/// Notification panel row.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationItem {
    pub id: f64,
    pub title: String,
    pub message: String,
    pub time: String,
    pub read: bool,
    /// `high|medium|low`.
    pub severity: String,
    /// CSS hex accent color.
    pub color: String,
}

/// Bell indicator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BellState {
    pub unread: u32,
    /// Whether the badge should render.
    pub show_badge: bool,
}

/// Records a successful login or registration response.
///
/// Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn session_sign_in(token: String, name: String, email: String) -> String {
    with_session_store(|store| {
        store.sign_in(token.trim(), name.trim(), email.trim());
    })
    .err()
    .unwrap_or_default()
}

/// Logout: removes token, profile and address together.
#[flutter_rust_bridge::frb(sync)]
pub fn session_logout() -> String {
    match with_session_store(|store| store.try_clear()) {
        Ok(Ok(())) => String::new(),
        Ok(Err(err)) => format!("session_logout failed: {err}"),
        Err(err) => err,
    }
}

/// True iff a non-empty token is persisted. Storage failures read as false.
#[flutter_rust_bridge::frb(sync)]
pub fn session_is_authenticated() -> bool {
    with_session_store(|store| store.is_authenticated()).unwrap_or(false)
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_identity() -> IdentityView {
    with_session_store(|store| {
        let profile = store.load();
        IdentityView {
            authenticated: profile.is_authenticated(),
            name: profile.display_name().to_string(),
            email: profile.email.clone(),
            avatar_url: profile.avatar_url().to_string(),
            address: profile.address.clone(),
        }
    })
    .unwrap_or_else(|_| IdentityView {
        authenticated: false,
        name: cryptoguard_core::DEFAULT_DISPLAY_NAME.to_string(),
        email: String::new(),
        avatar_url: cryptoguard_core::DEFAULT_AVATAR_URL.to_string(),
        address: None,
    })
}

/// Settings save: display name, optional avatar and address.
#[flutter_rust_bridge::frb(sync)]
pub fn session_update_settings(name: String, avatar: Option<String>, address: String) -> String {
    with_session_store(|store| {
        store.update_profile(name.as_str(), avatar.as_deref());
        store.set_address(address.as_str());
    })
    .err()
    .unwrap_or_default()
}

/// Route guard for the navigation shell.
#[flutter_rust_bridge::frb(sync)]
pub fn session_guard(route: String) -> RouteDecision {
    let access = with_session_store(|store| store.guard(route.as_str()))
        .unwrap_or_else(|_| cryptoguard_core::route_access(route.as_str(), false));
    match access {
        RouteAccess::Allow => RouteDecision {
            allowed: true,
            redirect_to: None,
        },
        RouteAccess::Redirect(target) => RouteDecision {
            allowed: false,
            redirect_to: Some(target.to_string()),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_remember_reset_email(email: String) -> String {
    with_session_store(|store| store.remember_reset_email(email.as_str()))
        .err()
        .unwrap_or_default()
}

/// Pending reset email; `None` means the reset screen was opened directly.
#[flutter_rust_bridge::frb(sync)]
pub fn session_reset_email() -> Option<String> {
    with_session_store(|store| store.reset_email())
        .ok()
        .flatten()
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_forget_reset_email() -> String {
    with_session_store(|store| store.forget_reset_email())
        .err()
        .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn favourites_list() -> Vec<FavouriteItem> {
    with_session_store(|store| {
        store
            .favourites()
            .into_iter()
            .map(|asset| FavouriteItem {
                symbol: asset.symbol,
                name: asset.name,
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Toggles a watchlist entry; returns whether it is a favourite afterwards.
#[flutter_rust_bridge::frb(sync)]
pub fn favourites_toggle(symbol: String, name: Option<String>) -> bool {
    let mut asset = FavouriteAsset::new(symbol.trim());
    if let Some(name) = name.filter(|value| !value.trim().is_empty()) {
        asset = asset.with_name(name.trim());
    }
    with_session_store(|store| store.toggle_favourite(asset)).unwrap_or(false)
}

/// Adds a notification; severity is inferred from the title.
///
/// Returns the new id, or `None` when the provider is unavailable.
#[flutter_rust_bridge::frb(sync)]
pub fn notify(title: String, message: String) -> Option<f64> {
    with_notification_store(|store| store.notify(NotificationDraft::new(title, message)).value())
        .ok()
}

/// Adds a notification with an explicit `high|medium|low` severity.
///
/// Unknown severity strings fall back to title inference.
#[flutter_rust_bridge::frb(sync)]
pub fn notify_with_severity(title: String, message: String, severity: String) -> Option<f64> {
    let mut draft = NotificationDraft::new(title, message);
    if let Some(severity) = parse_severity(severity.as_str()) {
        draft = draft.with_severity(severity);
    }
    with_notification_store(|store| store.notify(draft).value()).ok()
}

/// Panel rows, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_list() -> Vec<NotificationItem> {
    with_notification_store(|store| {
        panel_items(store)
            .into_iter()
            .map(|item| NotificationItem {
                id: item.id.value(),
                title: item.title,
                message: item.message,
                time: item.time,
                read: item.read,
                severity: item.severity.as_str().to_string(),
                color: item.color.to_string(),
            })
            .collect()
    })
    .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn notifications_bell() -> BellState {
    let unread = with_notification_store(|store| store.unread_count()).unwrap_or(0);
    BellState {
        unread: u32::try_from(unread).unwrap_or(u32::MAX),
        show_badge: unread > 0,
    }
}

/// Marks one entry read; returns whether anything changed.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_mark_read(id: f64) -> bool {
    with_notification_store(|store| store.mark_as_read(NotificationId::from_raw(id)))
        .unwrap_or(false)
}

#[flutter_rust_bridge::frb(sync)]
pub fn notifications_mark_all_read() -> String {
    with_notification_store(|store| store.mark_all_as_read())
        .err()
        .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn notifications_clear_all() -> String {
    with_notification_store(|store| store.clear_all())
        .err()
        .unwrap_or_default()
}

fn parse_severity(value: &str) -> Option<Severity> {
    match value.trim().to_ascii_lowercase().as_str() {
        "high" => Some(Severity::High),
        "medium" => Some(Severity::Medium),
        "low" => Some(Severity::Low),
        _ => None,
    }
}

fn resolve_state_db_path() -> PathBuf {
    STATE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("CRYPTOGUARD_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STATE_DB_FILE_NAME)
        })
        .clone()
}

fn with_session_store<T>(
    f: impl FnOnce(&SessionStore<SqliteKvRepository>) -> T,
) -> Result<T, String> {
    let db_path = resolve_state_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("state DB open failed: {err}"))?;
    let store = SessionStore::new(SqliteKvRepository::new(conn));
    Ok(f(&store))
}

/// Runs `f` against the shared provider, creating and loading it on first use.
///
/// Falls back to an in-memory database when the state file cannot be opened,
/// so notifications still work for the current session.
fn with_notification_store<T>(
    f: impl FnOnce(&mut NotificationStore<SqliteKvRepository>) -> T,
) -> Result<T, String> {
    let mut guard = lock_provider();
    if guard.is_none() {
        let conn = match open_db(resolve_state_db_path()) {
            Ok(conn) => conn,
            Err(err) => {
                warn!(
                    "event=notification_provider module=ffi status=fallback error_code=db_open_failed error={}",
                    err
                );
                open_db_in_memory().map_err(|err| format!("notification store unavailable: {err}"))?
            }
        };
        let mut store = NotificationStore::new(SqliteKvRepository::new(conn));
        store.load();
        *guard = Some(store);
    }

    match guard.as_mut() {
        Some(store) => Ok(f(store)),
        None => Err("notification store unavailable".to_string()),
    }
}

fn lock_provider() -> MutexGuard<'static, Option<NotificationStore<SqliteKvRepository>>> {
    // Mutations never leave the list half-written, so a poisoned lock is reusable.
    NOTIFICATION_PROVIDER
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, favourites_list, favourites_toggle, init_logging, notifications_bell,
        notifications_list, notifications_mark_read, notify, notify_with_severity, ping,
        session_guard, STATE_DB_FILE_NAME, STATE_DB_PATH,
    };
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    static TEST_STATE_DIR: OnceLock<TempDir> = OnceLock::new();

    /// Points the process-wide state path at a per-run temp dir before any
    /// exported call resolves it.
    fn use_test_state_db() {
        STATE_DB_PATH.get_or_init(|| {
            TEST_STATE_DIR
                .get_or_init(|| tempfile::tempdir().expect("create test state dir"))
                .path()
                .join(STATE_DB_FILE_NAME)
        });
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn public_routes_are_allowed_without_session() {
        use_test_state_db();
        let decision = session_guard("/register".to_string());
        assert!(decision.allowed);
        assert_eq!(decision.redirect_to, None);
    }

    #[test]
    fn notify_then_mark_read_through_shared_provider() {
        use_test_state_db();
        let token = unique_token("ffi-notify");
        let id = notify(format!("High risk {token}"), "Token X".to_string())
            .expect("provider should be available");

        let item = notifications_list()
            .into_iter()
            .find(|item| item.id == id)
            .expect("created notification should be listed");
        assert!(!item.read);
        assert_eq!(item.severity, "high");
        assert_eq!(item.color, "#f87171");
        assert!(notifications_bell().unread >= 1);

        assert!(notifications_mark_read(id));
        let item = notifications_list()
            .into_iter()
            .find(|item| item.id == id)
            .expect("notification should still be listed");
        assert!(item.read);
    }

    #[test]
    fn explicit_severity_is_stored() {
        use_test_state_db();
        let token = unique_token("ffi-severity");
        let id = notify_with_severity(
            format!("High volume {token}"),
            "ok".to_string(),
            "LOW".to_string(),
        )
        .expect("provider should be available");

        let item = notifications_list()
            .into_iter()
            .find(|item| item.id == id)
            .expect("created notification should be listed");
        assert_eq!(item.severity, "low");
    }

    #[test]
    fn favourites_toggle_round_trip() {
        use_test_state_db();
        let symbol = unique_token("COIN");
        assert!(favourites_toggle(symbol.clone(), Some("Test coin".to_string())));
        assert!(favourites_list().iter().any(|item| item.symbol == symbol));

        assert!(!favourites_toggle(symbol.clone(), None));
        assert!(!favourites_list().iter().any(|item| item.symbol == symbol));
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
