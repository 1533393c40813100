//! Notification domain model.
//!
//! # Responsibility
//! - Define the persisted notification entry and its severity.
//! - Generate identifiers that stay unique under rapid creation.
//!
//! # Invariants
//! - `read` only ever moves from `false` to `true`.
//! - `time` is fixed at creation and never recomputed.
//! - Ids handed out by one [`IdGenerator`] are strictly increasing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static SEVERITY_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(high|medium|low)\b").expect("valid severity keyword regex"));

/// Id slots available inside one millisecond.
const ID_SLOTS_PER_MS: u64 = 1_000;

/// Largest integer an `f64` (and a JSON number read by the web build) holds
/// exactly.
pub const MAX_SAFE_ID: u64 = (1 << 53) - 1;

/// Numeric notification identifier.
///
/// Serialized as a bare JSON number. Entries written by the web build carry
/// fractional ids (`Date.now() + Math.random()`), so the inner value is `f64`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(f64);

impl NotificationId {
    pub fn from_raw(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Notification severity, drives the panel accent color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Infers severity from a title for entries stored without one.
    ///
    /// The first whole word among `high`, `medium`, `low` wins, so
    /// "Low priority, high importance" is `Low`. No keyword means `Low`.
    pub fn classify_title(title: &str) -> Self {
        let lowered = title.to_lowercase();
        match SEVERITY_KEYWORD_RE
            .captures(&lowered)
            .and_then(|captures| captures.get(1))
            .map(|keyword| keyword.as_str())
        {
            Some("high") => Self::High,
            Some("medium") => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Accent color used by the notification panel.
    pub fn color(self) -> &'static str {
        match self {
            Self::High => "#f87171",
            Self::Medium => "#facc15",
            Self::Low => "#34d399",
        }
    }

    /// Color name (`red|yellow|green`) for non-CSS consumers.
    pub fn color_name(self) -> &'static str {
        match self {
            Self::High => "red",
            Self::Medium => "yellow",
            Self::Low => "green",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Producer input for `notify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    /// When `None`, severity is inferred from `title` once, at creation.
    pub severity: Option<Severity>,
}

impl NotificationDraft {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// One entry of the persisted `notifications` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub id: NotificationId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    /// Human-readable local creation time, e.g. `3:04:05 PM`.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub read: bool,
    /// Absent on entries written before severity was stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl NotificationEntry {
    pub(crate) fn from_draft(id: NotificationId, time: String, draft: NotificationDraft) -> Self {
        let severity = draft
            .severity
            .unwrap_or_else(|| Severity::classify_title(&draft.title));
        Self {
            id,
            title: draft.title,
            message: draft.message,
            time,
            read: false,
            severity: Some(severity),
        }
    }

    /// Stored severity, or the title keyword shim for legacy entries.
    pub fn severity(&self) -> Severity {
        self.severity
            .unwrap_or_else(|| Severity::classify_title(&self.title))
    }

    /// Returns `true` when the flag actually changed.
    pub fn mark_read(&mut self) -> bool {
        let changed = !self.read;
        self.read = true;
        changed
    }
}

/// Time-based id source with a per-generator sequence component.
///
/// `id = epoch_ms * 1000 + sequence % 1000`, bumped past the last issued id
/// when the clock stalls or goes backwards.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: u64,
    sequence: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the floor so new ids sort after an already persisted one.
    ///
    /// Ids above [`MAX_SAFE_ID`] are not exact integers and never leave the
    /// floor; returns `false` when `id` was ignored for that reason.
    pub fn observe(&mut self, id: NotificationId) -> bool {
        let value = id.value();
        if !value.is_finite() || value <= 0.0 {
            return true;
        }
        if value > MAX_SAFE_ID as f64 {
            return false;
        }
        self.last = self.last.max(value.ceil() as u64);
        true
    }

    /// Next id, strictly above every id issued or observed so far.
    ///
    /// A clock reading outside the exact range falls back to `last + 1`.
    pub fn next_id(&mut self, now_epoch_ms: i64) -> NotificationId {
        let base = u64::try_from(now_epoch_ms)
            .unwrap_or(0)
            .saturating_mul(ID_SLOTS_PER_MS);
        self.sequence = self.sequence.wrapping_add(1);
        let candidate = base.saturating_add(self.sequence % ID_SLOTS_PER_MS);
        let next = if candidate > self.last && candidate <= MAX_SAFE_ID {
            candidate
        } else {
            self.last.saturating_add(1)
        };
        self.last = next;
        NotificationId(next as f64)
    }
}
