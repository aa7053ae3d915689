//! Wallet service configuration.

use chrono::Duration;
use monieking_common::{constants, WalletError, WalletResult};
use monieking_fx::FxEngineConfig;
use tracing::warn;

/// Main wallet service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Idle time after which a session must login again.
    pub session_idle_timeout: Duration,
    /// Conversion engine configuration.
    pub fx: FxEngineConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            session_idle_timeout: constants::session_idle_timeout(),
            fx: FxEngineConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self {
            fx: FxEngineConfig::from_env(),
            ..Self::default()
        };

        if let Ok(secs) = std::env::var("MONIEKING_SESSION_TIMEOUT_SECS") {
            match secs.parse::<i64>() {
                Ok(secs) => config.session_idle_timeout = Duration::seconds(secs),
                Err(_) => warn!(value = %secs, "Ignoring unparseable MONIEKING_SESSION_TIMEOUT_SECS"),
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> WalletResult<()> {
        if self.session_idle_timeout <= Duration::zero() {
            return Err(WalletError::ConfigurationError(
                "Session idle timeout must be positive".to_string(),
            ));
        }

        self.fx.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session_idle_timeout, Duration::minutes(30));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = LedgerConfig::default();
        config.session_idle_timeout = Duration::zero();
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::default();
        config.fx.fee_rate = dec!(1.5);
        assert!(matches!(
            config.validate(),
            Err(WalletError::ConfigurationError(_))
        ));
    }
}
