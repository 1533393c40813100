//! Persisted key names shared with the web dashboard.
//!
//! Values must stay byte-identical to the keys the browser build writes, so
//! state survives moving between shells.

pub const TOKEN: &str = "token";
pub const USER_PROFILE: &str = "user_profile";
pub const ADDRESS: &str = "address";
pub const NOTIFICATIONS: &str = "notifications";
pub const FAVOURITES: &str = "favourites";
pub const RESET_EMAIL: &str = "resetEmail";

/// Keys removed together on logout.
pub const SESSION_KEYS: [&str; 3] = [TOKEN, USER_PROFILE, ADDRESS];
