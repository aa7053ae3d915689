//! Caller-owned wallet sessions with an idle timeout.

use chrono::Duration;
use monieking_common::{has_elapsed, Timestamp, WalletError, WalletId, WalletResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Session context passed to every wallet service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    wallet_id: WalletId,
    logged_in: bool,
    last_activity: Timestamp,
    #[serde(with = "duration_secs")]
    idle_timeout: Duration,
}

impl Session {
    /// Start a logged-in session.
    pub fn login(wallet_id: WalletId, at: Timestamp, idle_timeout: Duration) -> Self {
        info!(wallet_id = %wallet_id, "Session started");
        Self {
            wallet_id,
            logged_in: true,
            last_activity: at,
            idle_timeout,
        }
    }

    pub fn logout(&mut self) {
        if self.logged_in {
            info!(wallet_id = %self.wallet_id, "Session ended");
        }
        self.logged_in = false;
    }

    pub fn wallet_id(&self) -> WalletId {
        self.wallet_id
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    /// Whether the idle timeout has passed at `at`.
    pub fn is_expired(&self, at: Timestamp) -> bool {
        has_elapsed(self.last_activity, self.idle_timeout, at)
    }

    /// Time left before the session idles out.
    pub fn time_remaining(&self, at: Timestamp) -> Duration {
        let remaining = self.idle_timeout - (at - self.last_activity);
        if remaining < Duration::zero() {
            Duration::zero()
        } else {
            remaining
        }
    }

    /// Check the session and record activity.
    ///
    /// An expired session is logged out and stays logged out.
    pub fn authorize(&mut self, at: Timestamp) -> WalletResult<WalletId> {
        if !self.logged_in {
            return Err(WalletError::NotAuthenticated);
        }
        if self.is_expired(at) {
            warn!(wallet_id = %self.wallet_id, last_activity = %self.last_activity, "Session expired");
            self.logged_in = false;
            return Err(WalletError::SessionExpired);
        }
        if at > self.last_activity {
            self.last_activity = at;
        }
        Ok(self.wallet_id)
    }
}

mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::seconds(i64::deserialize(deserializer)?))
    }
}
