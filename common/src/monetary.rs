//! Monetary types for MonieKing wallets.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{WalletError, WalletResult};

/// Minor-unit precision applied to every currency.
///
/// Zero-decimal currencies such as JPY are still rounded to two places.
pub const MINOR_UNIT_DP: u32 = 2;

/// Round a value to the minor unit, midpoint away from zero.
pub fn round_minor(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MINOR_UNIT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Smallest amount a wallet operation accepts: one minor unit.
pub const MINIMUM_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, MINOR_UNIT_DP);

/// Whether `value` has no digits below the minor unit.
pub fn has_minor_unit_precision(value: Decimal) -> bool {
    value.normalize().scale() <= MINOR_UNIT_DP
}

/// Whether `amount` can be moved: at least one minor unit and no finer.
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount >= MINIMUM_AMOUNT && has_minor_unit_precision(amount)
}

/// `InvalidAmount` unless [`is_valid_amount`] holds.
pub fn ensure_valid_amount(amount: Decimal) -> WalletResult<()> {
    if !is_valid_amount(amount) {
        return Err(WalletError::InvalidAmount(amount.to_string()));
    }
    Ok(())
}

/// Convert a boundary float into a decimal amount.
///
/// NaN and infinite inputs are rejected with `InvalidAmount`.
pub fn amount_from_f64(value: f64) -> WalletResult<Decimal> {
    if !value.is_finite() {
        return Err(WalletError::InvalidAmount(value.to_string()));
    }
    Decimal::from_f64(value).ok_or_else(|| WalletError::InvalidAmount(value.to_string()))
}

/// Parse a user-supplied amount string.
///
/// Float notation such as `1.5e2` goes through [`amount_from_f64`], so
/// `NaN` and `inf` are rejected.
pub fn parse_amount(value: &str) -> WalletResult<Decimal> {
    let text = value.trim();
    if let Ok(amount) = text.parse::<Decimal>() {
        return Ok(amount);
    }
    text.parse::<f64>()
        .map_err(|_| WalletError::InvalidAmount(value.to_string()))
        .and_then(amount_from_f64)
}

/// A monetary amount with currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount value.
    pub value: Decimal,
    /// Currency code.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money instance.
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Create from a string value.
    pub fn parse(value: &str, currency: Currency) -> WalletResult<Self> {
        Ok(Self {
            value: parse_amount(value)?,
            currency,
        })
    }

    /// Render with the currency symbol and thousands separators, e.g. `$1,250.00`.
    pub fn display_amount(&self) -> String {
        let rounded = round_minor(self.value.abs());
        let text = format!("{:.2}", rounded);
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.value.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{}{}{}.{}", sign, self.currency.symbol(), grouped, frac)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Display symbol; codes without one fall back to the code itself.
    pub fn symbol(&self) -> &str {
        match self.0.as_str() {
            "USD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "NGN" => "₦",
            other => other,
        }
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn ngn() -> Self {
        Self::new("NGN")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A directed currency pair for conversions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted from.
    pub from: Currency,
    /// Currency being converted to.
    pub to: Currency,
}

impl CurrencyPair {
    pub fn new(from: Currency, to: Currency) -> Self {
        Self { from, to }
    }

    /// Whether both sides are the same currency.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_code_normalised() {
        assert_eq!(Currency::new(" usd "), Currency::usd());
        assert_eq!(Currency::from("ngn").code(), "NGN");
    }

    #[test]
    fn test_round_minor_midpoint_away_from_zero() {
        assert_eq!(round_minor(dec!(90.625)), dec!(90.63));
        assert_eq!(round_minor(dec!(90.615)), dec!(90.62));
        assert_eq!(round_minor(dec!(-0.005)), dec!(-0.01));
    }

    #[test]
    fn test_display_amount() {
        assert_eq!(Money::new(dec!(1250), Currency::usd()).display_amount(), "$1,250.00");
        assert_eq!(Money::new(dec!(580000), Currency::ngn()).display_amount(), "₦580,000.00");
        assert_eq!(Money::new(dec!(320.5), Currency::gbp()).display_amount(), "£320.50");
        assert_eq!(Money::new(dec!(0.5), Currency::eur()).display_amount(), "€0.50");
        assert_eq!(Money::new(dec!(1000000), Currency::new("CAD")).display_amount(), "CAD1,000,000.00");
    }

    #[test]
    fn test_amount_from_f64_rejects_non_finite() {
        assert!(matches!(amount_from_f64(f64::NAN), Err(WalletError::InvalidAmount(_))));
        assert!(matches!(amount_from_f64(f64::INFINITY), Err(WalletError::InvalidAmount(_))));
        assert_eq!(amount_from_f64(12.5).unwrap(), dec!(12.5));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("abc").is_err());
        assert_eq!(parse_amount(" 98.50 ").unwrap(), dec!(98.50));
    }

    #[test]
    fn test_parse_amount_float_notation() {
        assert_eq!(parse_amount("1.5e2").unwrap(), dec!(150));
        assert!(matches!(parse_amount("NaN"), Err(WalletError::InvalidAmount(_))));
        assert!(matches!(parse_amount("inf"), Err(WalletError::InvalidAmount(_))));
        assert!(matches!(parse_amount("-infinity"), Err(WalletError::InvalidAmount(_))));
    }

    #[test]
    fn test_valid_amounts_respect_minor_unit() {
        assert!(is_valid_amount(dec!(0.01)));
        assert!(is_valid_amount(dec!(250.50)));
        assert!(is_valid_amount(dec!(1.500)));
        assert!(!is_valid_amount(dec!(0.005)));
        assert!(!is_valid_amount(dec!(0.001)));
        assert!(!is_valid_amount(dec!(10.125)));
        assert!(!is_valid_amount(dec!(0)));
        assert!(!is_valid_amount(dec!(-1)));
        assert!(has_minor_unit_precision(dec!(0)));
        assert_eq!(
            ensure_valid_amount(dec!(0.001)),
            Err(WalletError::InvalidAmount("0.001".to_string()))
        );
    }

    #[test]
    fn test_pair_identity() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::eur());
        assert!(!pair.is_identity());
        assert!(CurrencyPair::new(Currency::gbp(), Currency::gbp()).is_identity());
        assert_eq!(pair.to_string(), "USD/EUR");
    }
}
