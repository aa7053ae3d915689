//! Conversion quote types.

use monieking_common::{Currency, CurrencyPair, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rate_table::RateSource;

/// A non-binding preview of a conversion.
///
/// Carries no timestamp or id so identical inputs produce equal quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Amount debited from the source currency.
    pub gross_amount: Money,
    /// Fee retained, in the source currency.
    pub fee: Money,
    /// Amount actually converted (`gross - fee`).
    pub net_amount: Money,
    /// Amount credited in the destination currency, rounded to minor units.
    pub converted_amount: Money,
    /// Multiplier applied to the net amount.
    pub rate_used: Decimal,
    /// Provenance of the multiplier.
    pub rate_source: RateSource,
}

impl Quote {
    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(
            self.gross_amount.currency.clone(),
            self.converted_amount.currency.clone(),
        )
    }

    /// Destination amount per unit of gross source amount, fees included.
    pub fn effective_rate(&self) -> Decimal {
        self.converted_amount
            .value
            .checked_div(self.gross_amount.value)
            .unwrap_or(Decimal::ZERO)
    }

    /// Whether the rate came from the unknown-pair fallback.
    pub fn is_low_confidence(&self) -> bool {
        self.rate_source.is_low_confidence()
    }
}

/// Holdings expressed in one base currency at table rates, without fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    /// Sum of the converted holdings, each rounded to minor units.
    pub total: Money,
    /// Currencies valued at the unknown-pair fallback.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_currencies: Vec<Currency>,
}

impl Valuation {
    pub fn is_low_confidence(&self) -> bool {
        !self.fallback_currencies.is_empty()
    }
}
