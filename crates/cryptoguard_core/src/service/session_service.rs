//! Session/profile store.
//!
//! # Responsibility
//! - Read and write the persisted identity (`token`, `user_profile`) and the
//!   preferences next to it (`address`, `favourites`, `resetEmail`).
//! - Answer route-guard questions from persisted state only.
//!
//! # Invariants
//! - No in-memory copy: every read goes to the repository.
//! - `save` and `clear` touch all session keys in one atomic batch.
//! - Malformed or unreadable persisted data reads as defaults, never as error.

use crate::model::session::{DisplayIdentity, FavouriteAsset, SessionProfile, StoredUserProfile};
use crate::repo::keys;
use crate::repo::kv_repo::{KvRepository, KvWrite, RepoError, RepoResult};
use log::{info, warn};
use serde::de::DeserializeOwned;

/// Where unauthenticated visitors are sent.
pub const LOGIN_ROUTE: &str = "/login";

/// Routes reachable without a token.
pub const PUBLIC_ROUTES: [&str; 4] = ["/login", "/register", "/forgot-password", "/reset-password"];

/// Outcome of a route-guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Allow,
    Redirect(&'static str),
}

/// Decides access for `route` given the authentication state.
pub fn route_access(route: &str, authenticated: bool) -> RouteAccess {
    let path = route.split(['?', '#']).next().unwrap_or_default();
    let normalized = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    if authenticated || PUBLIC_ROUTES.contains(&normalized) {
        RouteAccess::Allow
    } else {
        RouteAccess::Redirect(LOGIN_ROUTE)
    }
}

/// Persisted session/profile store.
pub struct SessionStore<R: KvRepository> {
    repo: R,
}

impl<R: KvRepository> SessionStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Reads the persisted profile, yielding defaults for anything absent,
    /// malformed or unreadable.
    pub fn load(&self) -> SessionProfile {
        let stored: StoredUserProfile = self.read_json(keys::USER_PROFILE).unwrap_or_default();
        SessionProfile {
            token: self.read_string(keys::TOKEN),
            name: stored.name.unwrap_or_default(),
            email: stored.email.unwrap_or_default(),
            avatar: stored.avatar,
            address: self.read_string(keys::ADDRESS),
        }
    }

    /// Overwrites the whole persisted record with `profile`.
    ///
    /// Best effort: a rejected write is logged and otherwise ignored.
    pub fn save(&self, profile: &SessionProfile) {
        if let Err(err) = self.try_save(profile) {
            warn!(
                "event=session_save module=session status=error error_code=persist_failed error={}",
                err
            );
        }
    }

    /// Like [`save`](Self::save) but reports persistence failures.
    pub fn try_save(&self, profile: &SessionProfile) -> RepoResult<()> {
        let stored = serde_json::to_string(&profile.stored_profile())
            .map_err(|err| RepoError::WriteRejected(err.to_string()))?;

        let writes = [
            optional_write(keys::TOKEN, profile.token.as_deref()),
            KvWrite::set(keys::USER_PROFILE, stored),
            optional_write(keys::ADDRESS, profile.address.as_deref()),
        ];
        self.repo.apply(&writes)?;

        info!(
            "event=session_save module=session status=ok authenticated={} has_avatar={}",
            profile.is_authenticated(),
            profile.avatar.is_some()
        );
        Ok(())
    }

    /// True iff a non-empty token is persisted.
    pub fn is_authenticated(&self) -> bool {
        self.read_string(keys::TOKEN)
            .is_some_and(|token| !token.is_empty())
    }

    /// Removes token, profile and address together (logout).
    pub fn clear(&self) {
        if let Err(err) = self.try_clear() {
            warn!(
                "event=session_clear module=session status=error error_code=persist_failed error={}",
                err
            );
        }
    }

    /// Like [`clear`](Self::clear) but reports persistence failures.
    pub fn try_clear(&self) -> RepoResult<()> {
        let writes = keys::SESSION_KEYS.map(KvWrite::remove);
        self.repo.apply(&writes)?;
        info!("event=session_clear module=session status=ok");
        Ok(())
    }

    /// Records a successful login or registration.
    ///
    /// Identity is fully replaced (a previous avatar is dropped); the address
    /// preference is kept.
    pub fn sign_in(&self, token: &str, name: &str, email: &str) {
        let mut profile = SessionProfile::signed_in(token, name, email);
        profile.address = self.read_string(keys::ADDRESS);
        self.save(&profile);
    }

    /// Settings edit: replaces display name and avatar, keeps everything else.
    pub fn update_profile(&self, name: &str, avatar: Option<&str>) {
        let mut profile = self.load();
        profile.name = name.trim().to_string();
        profile.avatar = avatar
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        self.save(&profile);
    }

    /// Settings edit for the address; blank input removes it.
    pub fn set_address(&self, address: &str) {
        let trimmed = address.trim();
        let write = optional_write(keys::ADDRESS, Some(trimmed).filter(|v| !v.is_empty()));
        if let Err(err) = self.repo.apply(&[write]) {
            warn!(
                "event=session_address module=session status=error error_code=persist_failed error={}",
                err
            );
        }
    }

    /// Top-bar identity with fallbacks applied.
    pub fn display_identity(&self) -> DisplayIdentity {
        DisplayIdentity::from(&self.load())
    }

    /// Route guard backed by persisted state.
    pub fn guard(&self, route: &str) -> RouteAccess {
        route_access(route, self.is_authenticated())
    }

    /// Watchlist in stored order; malformed data reads as empty.
    pub fn favourites(&self) -> Vec<FavouriteAsset> {
        self.read_json(keys::FAVOURITES).unwrap_or_default()
    }

    pub fn is_favourite(&self, symbol: &str) -> bool {
        self.favourites()
            .iter()
            .any(|asset| asset.matches_symbol(symbol))
    }

    /// Adds `asset` to the watchlist, or removes it when already present.
    ///
    /// Returns whether the asset is a favourite afterwards. A stored value
    /// that does not parse as a watchlist is left untouched and the call
    /// returns `false`.
    pub fn toggle_favourite(&self, asset: FavouriteAsset) -> bool {
        let mut favourites: Vec<FavouriteAsset> = match self.read_string(keys::FAVOURITES) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Option<Vec<FavouriteAsset>>>(&raw) {
                Ok(parsed) => parsed.unwrap_or_default(),
                Err(err) => {
                    warn!(
                        "event=favourites_toggle module=session status=skipped error_code=malformed_json error={}",
                        err
                    );
                    return false;
                }
            },
        };
        let before = favourites.len();
        favourites.retain(|existing| !existing.matches_symbol(&asset.symbol));
        let now_favourite = favourites.len() == before;
        if now_favourite {
            favourites.push(asset);
        }

        match serde_json::to_string(&favourites) {
            Ok(raw) => {
                if let Err(err) = self.repo.set(keys::FAVOURITES, &raw) {
                    warn!(
                        "event=favourites_toggle module=session status=error error_code=persist_failed error={}",
                        err
                    );
                }
            }
            Err(err) => warn!(
                "event=favourites_toggle module=session status=error error_code=encode_failed error={}",
                err
            ),
        }
        now_favourite
    }

    /// Remembers the email between the forgot-password and reset steps.
    pub fn remember_reset_email(&self, email: &str) {
        if let Err(err) = self.repo.set(keys::RESET_EMAIL, email.trim()) {
            warn!(
                "event=reset_email module=session status=error error_code=persist_failed error={}",
                err
            );
        }
    }

    /// Pending reset email; `None` means the reset step was reached directly.
    pub fn reset_email(&self) -> Option<String> {
        self.read_string(keys::RESET_EMAIL)
            .filter(|email| !email.is_empty())
    }

    pub fn forget_reset_email(&self) {
        if let Err(err) = self.repo.remove(keys::RESET_EMAIL) {
            warn!(
                "event=reset_email module=session status=error error_code=persist_failed error={}",
                err
            );
        }
    }

    fn read_string(&self, key: &str) -> Option<String> {
        match self.repo.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "event=session_read module=session status=error key={} error_code=read_failed error={}",
                    key, err
                );
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_string(key)?;
        match serde_json::from_str::<Option<T>>(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "event=session_read module=session status=fallback key={} error_code=malformed_json error={}",
                    key, err
                );
                None
            }
        }
    }
}

fn optional_write(key: &str, value: Option<&str>) -> KvWrite {
    match value {
        Some(value) => KvWrite::set(key, value),
        None => KvWrite::remove(key),
    }
}
