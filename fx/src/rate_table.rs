//! Rate table trait and the static implementation.

use std::collections::BTreeMap;

use monieking_common::{Currency, CurrencyPair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// Where a looked-up rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    /// Configured multiplier for the pair.
    Configured,
    /// Same currency on both sides.
    Identity,
    /// Pair not configured; the 1.0 fallback was used.
    Fallback,
}

impl RateSource {
    /// Fallback rates are low confidence and may misprice a conversion.
    pub fn is_low_confidence(&self) -> bool {
        matches!(self, RateSource::Fallback)
    }
}

/// Result of a rate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLookup {
    pub rate: Decimal,
    pub source: RateSource,
}

/// Trait for conversion rate tables.
///
/// Implementations are immutable once constructed.
pub trait RateTable: Send + Sync {
    /// Get the table name.
    fn name(&self) -> &str;

    /// Look up the multiplier for a pair along with its provenance.
    fn lookup(&self, from: &Currency, to: &Currency) -> RateLookup;

    /// Multiplier for a pair: 1.0 for identity and unknown pairs.
    fn rate(&self, from: &Currency, to: &Currency) -> Decimal {
        self.lookup(from, to).rate
    }

    /// Get all configured currency pairs.
    fn supported_pairs(&self) -> Vec<CurrencyPair>;
}

/// Fixed in-memory rate table.
#[derive(Debug, Clone)]
pub struct StaticRateTable {
    name: String,
    rates: BTreeMap<CurrencyPair, Decimal>,
}

impl StaticRateTable {
    /// Start building a table.
    pub fn builder(name: impl Into<String>) -> StaticRateTableBuilder {
        StaticRateTableBuilder {
            name: name.into(),
            rates: BTreeMap::new(),
        }
    }

    /// The standard MonieKing table for USD, EUR, GBP and NGN.
    pub fn standard() -> Self {
        const RATES: &[(&str, &str, i64, u32)] = &[
            ("USD", "EUR", 92, 2),
            ("USD", "GBP", 79, 2),
            ("USD", "NGN", 1650, 0),
            ("EUR", "USD", 109, 2),
            ("EUR", "GBP", 86, 2),
            ("EUR", "NGN", 1800, 0),
            ("GBP", "USD", 127, 2),
            ("GBP", "EUR", 116, 2),
            ("GBP", "NGN", 2100, 0),
            ("NGN", "USD", 61, 5),
            ("NGN", "EUR", 56, 5),
            ("NGN", "GBP", 48, 5),
        ];

        let rates = RATES
            .iter()
            .map(|(from, to, mantissa, scale)| {
                (
                    CurrencyPair::new(Currency::new(*from), Currency::new(*to)),
                    Decimal::new(*mantissa, *scale),
                )
            })
            .collect();

        Self {
            name: "STANDARD".to_string(),
            rates,
        }
    }
}

impl RateTable for StaticRateTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, from: &Currency, to: &Currency) -> RateLookup {
        let pair = CurrencyPair::new(from.clone(), to.clone());
        if pair.is_identity() {
            return RateLookup {
                rate: Decimal::ONE,
                source: RateSource::Identity,
            };
        }

        match self.rates.get(&pair) {
            Some(rate) => RateLookup {
                rate: *rate,
                source: RateSource::Configured,
            },
            None => RateLookup {
                rate: Decimal::ONE,
                source: RateSource::Fallback,
            },
        }
    }

    fn supported_pairs(&self) -> Vec<CurrencyPair> {
        self.rates.keys().cloned().collect()
    }
}

impl Default for StaticRateTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Builder for custom static tables.
pub struct StaticRateTableBuilder {
    name: String,
    rates: BTreeMap<CurrencyPair, Decimal>,
}

impl StaticRateTableBuilder {
    /// Add a directed rate.
    pub fn rate(mut self, from: Currency, to: Currency, rate: Decimal) -> Self {
        self.rates.insert(CurrencyPair::new(from, to), rate);
        self
    }

    /// Build the table, rejecting non-positive multipliers.
    pub fn build(self) -> FxResult<StaticRateTable> {
        if let Some((pair, rate)) = self.rates.iter().find(|(_, rate)| **rate <= Decimal::ZERO) {
            return Err(FxError::InvalidRate {
                pair: pair.clone(),
                rate: *rate,
            });
        }

        Ok(StaticRateTable {
            name: self.name,
            rates: self.rates,
        })
    }
}
