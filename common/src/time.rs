//! Time utilities and the clock abstraction for MonieKing.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Wallet timing constants.
pub mod constants {
    use super::Duration;

    /// Idle time after which a session is logged out (30 minutes).
    pub fn session_idle_timeout() -> Duration {
        Duration::minutes(30)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by `Utc::now`, clamped so it never runs backwards.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<Option<Timestamp>>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let mut last = self.last.lock();
        let current = Utc::now();
        let next = match *last {
            Some(prev) if prev > current => prev,
            _ => current,
        };
        *last = Some(next);
        next
    }
}

/// Manually advanced clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current += by;
    }

    pub fn set(&self, to: Timestamp) {
        *self.current.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}

/// Check whether `since` is older than `timeout` at `at`.
pub fn has_elapsed(since: Timestamp, timeout: Duration, at: Timestamp) -> bool {
    at - since > timeout
}
