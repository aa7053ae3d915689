//! Error types for MonieKing wallet operations.

use crate::{Currency, CurrencyPair, ProductId, TransactionId, WalletId};
use thiserror::Error;

/// Main error type for wallet operations.
///
/// Every variant is a deterministic validation failure; none are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Amount is non-positive, non-finite or unparseable.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Arithmetic on an amount exceeded the decimal range.
    #[error("Amount out of range")]
    AmountOverflow,

    /// Debit exceeds the available balance.
    #[error("Insufficient funds in {currency}: required {required}, available {available}")]
    InsufficientFunds {
        currency: Currency,
        required: String,
        available: String,
    },

    /// The fee consumes the entire amount being converted.
    #[error("Amount {amount} does not cover fee {fee}")]
    InsufficientAmount { amount: String, fee: String },

    /// No configured rate for the pair and the engine runs fail-closed.
    #[error("Unknown currency pair: {0}")]
    UnknownCurrencyPair(CurrencyPair),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    /// Transaction already reached a terminal status.
    #[error("Transaction already settled: {0}")]
    AlreadySettled(TransactionId),

    /// Wallet not found.
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// Session is logged out.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Session idled past its timeout.
    #[error("Session expired, please login again")]
    SessionExpired,

    /// Product not in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Product is out of stock.
    #[error("Product unavailable: {0}")]
    ProductUnavailable(ProductId),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl WalletError {
    /// Get a stable error code for callers.
    pub fn error_code(&self) -> &'static str {
        match self {
            WalletError::InvalidAmount(_) => "INVALID_AMOUNT",
            WalletError::AmountOverflow => "AMOUNT_OVERFLOW",
            WalletError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            WalletError::InsufficientAmount { .. } => "INSUFFICIENT_AMOUNT",
            WalletError::UnknownCurrencyPair(_) => "UNKNOWN_CURRENCY_PAIR",
            WalletError::NotFound(_) => "NOT_FOUND",
            WalletError::AlreadySettled(_) => "ALREADY_SETTLED",
            WalletError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            WalletError::NotAuthenticated => "NOT_AUTHENTICATED",
            WalletError::SessionExpired => "SESSION_EXPIRED",
            WalletError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            WalletError::ProductUnavailable(_) => "PRODUCT_UNAVAILABLE",
            WalletError::ConfigurationError(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Whether the caller must login again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            WalletError::NotAuthenticated | WalletError::SessionExpired
        )
    }
}

/// Result type alias for wallet operations.
pub type WalletResult<T> = std::result::Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(WalletError::SessionExpired.error_code(), "SESSION_EXPIRED");
        assert_eq!(
            WalletError::AlreadySettled(TransactionId::new("TXN1")).error_code(),
            "ALREADY_SETTLED"
        );
    }

    #[test]
    fn test_requires_login() {
        assert!(WalletError::NotAuthenticated.requires_login());
        assert!(!WalletError::InvalidAmount("0".into()).requires_login());
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = WalletError::InsufficientFunds {
            currency: Currency::usd(),
            required: "1250.01".into(),
            available: "1250.00".into(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in USD: required 1250.01, available 1250.00"
        );
    }
}
