//! Client-side state core for the CryptoGuard portfolio dashboard.
//! This crate is the single source of truth for session and notification
//! invariants; UI shells only render what it returns.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::notification::{
    IdGenerator, NotificationDraft, NotificationEntry, NotificationId, Severity, MAX_SAFE_ID,
};
pub use model::session::{
    DisplayIdentity, FavouriteAsset, SessionProfile, DEFAULT_AVATAR_URL, DEFAULT_DISPLAY_NAME,
};
pub use repo::kv_repo::{
    KvRepository, KvWrite, MemoryKvRepository, RepoError, RepoResult, SqliteKvRepository,
};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::notification_service::NotificationStore;
pub use service::notification_view::{panel_items, NotificationBell, PanelItem, EMPTY_PANEL_TEXT};
pub use service::session_service::{
    route_access, RouteAccess, SessionStore, LOGIN_ROUTE, PUBLIC_ROUTES,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
