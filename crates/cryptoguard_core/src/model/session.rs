//! Session and profile domain model.
//!
//! # Responsibility
//! - Define the identity/preference record the top bar and route guards read.
//! - Define the persisted JSON shapes for `user_profile` and `favourites`.
//!
//! # Invariants
//! - A missing or empty `token` means unauthenticated, whatever else is set.
//! - Display fallbacks are applied at read time, never written back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Display name shown when the profile has none.
pub const DEFAULT_DISPLAY_NAME: &str = "User";
/// Generated avatar shown when the profile has none.
pub const DEFAULT_AVATAR_URL: &str = "https://ui-avatars.com/api/?background=10b981&color=fff";

/// Current authenticated identity plus light preferences.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionProfile {
    /// Opaque bearer credential issued by the backend.
    pub token: Option<String>,
    pub name: String,
    pub email: String,
    /// Image data URI or URL.
    pub avatar: Option<String>,
    /// Free-text address, independent of identity.
    pub address: Option<String>,
}

impl SessionProfile {
    /// Creates a freshly signed-in profile without avatar or address.
    pub fn signed_in(
        token: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            token: Some(token.into()),
            name: name.into(),
            email: email.into(),
            avatar: None,
            address: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }

    /// Name for the top bar, falling back to [`DEFAULT_DISPLAY_NAME`].
    pub fn display_name(&self) -> &str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            DEFAULT_DISPLAY_NAME
        } else {
            trimmed
        }
    }

    /// Avatar for the top bar, falling back to [`DEFAULT_AVATAR_URL`].
    pub fn avatar_url(&self) -> &str {
        match self.avatar.as_deref() {
            Some(avatar) if !avatar.trim().is_empty() => avatar,
            _ => DEFAULT_AVATAR_URL,
        }
    }

    pub(crate) fn stored_profile(&self) -> StoredUserProfile {
        StoredUserProfile {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            avatar: self.avatar.clone(),
        }
    }
}

/// Persisted `user_profile` JSON object: `{name, email, avatar?}`.
///
/// Every field tolerates `null` or absence because the web build has written
/// all of those shapes at some point.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) struct StoredUserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Top-bar identity projection with fallbacks already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayIdentity {
    pub name: String,
    pub avatar_url: String,
}

impl From<&SessionProfile> for DisplayIdentity {
    fn from(profile: &SessionProfile) -> Self {
        Self {
            name: profile.display_name().to_string(),
            avatar_url: profile.avatar_url().to_string(),
        }
    }
}

/// Watchlist entry persisted under `favourites`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavouriteAsset {
    /// Ticker, compared case-insensitively.
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Fields written by other clients, carried through rewrites untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FavouriteAsset {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn matches_symbol(&self, symbol: &str) -> bool {
        self.symbol.trim().eq_ignore_ascii_case(symbol.trim())
    }
}
