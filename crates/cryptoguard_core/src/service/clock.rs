//! Time source for store timestamps.

use chrono::{Local, Utc};

/// Clock used by stores to stamp new records.
pub trait Clock {
    /// Unix epoch milliseconds.
    fn now_epoch_ms(&self) -> i64;
    /// Local wall-clock label shown next to a notification.
    fn time_label(&self) -> String;
}

/// Wall clock in the process's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn time_label(&self) -> String {
        Local::now().format("%-I:%M:%S %p").to_string()
    }
}

/// Frozen clock for deterministic tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    pub epoch_ms: i64,
    pub label: String,
}

impl FixedClock {
    pub fn new(epoch_ms: i64, label: impl Into<String>) -> Self {
        Self {
            epoch_ms,
            label: label.into(),
        }
    }
}

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    fn time_label(&self) -> String {
        self.label.clone()
    }
}
