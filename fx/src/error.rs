//! FX engine error types.

use monieking_common::{CurrencyPair, WalletError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while quoting a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxError {
    /// Amount is negative or non-positive where a positive amount is required.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Multiplying or summing amounts left the decimal range.
    #[error("Amount out of range")]
    AmountOverflow,

    /// Fee consumes the entire amount.
    #[error("Amount {amount} does not cover fee {fee}")]
    InsufficientAmount { amount: Decimal, fee: Decimal },

    /// Rate not configured for the pair and fallback is disabled.
    #[error("Unknown currency pair: {0}")]
    UnknownCurrencyPair(CurrencyPair),

    /// A configured multiplier is zero or negative.
    #[error("Invalid rate {rate} for {pair}")]
    InvalidRate { pair: CurrencyPair, rate: Decimal },

    /// Fee policy or engine configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

impl From<FxError> for WalletError {
    fn from(err: FxError) -> Self {
        match err {
            FxError::InvalidAmount(amount) => WalletError::InvalidAmount(amount.to_string()),
            FxError::AmountOverflow => WalletError::AmountOverflow,
            FxError::InsufficientAmount { amount, fee } => WalletError::InsufficientAmount {
                amount: amount.to_string(),
                fee: fee.to_string(),
            },
            FxError::UnknownCurrencyPair(pair) => WalletError::UnknownCurrencyPair(pair),
            FxError::InvalidRate { .. } | FxError::InvalidConfiguration(_) => {
                WalletError::ConfigurationError(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monieking_common::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_into_wallet_error() {
        let err: WalletError = FxError::InsufficientAmount {
            amount: dec!(0.5),
            fee: dec!(1.00),
        }
        .into();
        assert_eq!(err.error_code(), "INSUFFICIENT_AMOUNT");

        let pair = CurrencyPair::new(Currency::usd(), Currency::new("CAD"));
        let err: WalletError = FxError::InvalidRate { pair, rate: dec!(0) }.into();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");

        let err: WalletError = FxError::AmountOverflow.into();
        assert_eq!(err, WalletError::AmountOverflow);
    }
}
