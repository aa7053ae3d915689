//! Conversion engine: composes a rate table and a fee policy into quotes.

use std::sync::Arc;

use monieking_common::{is_valid_amount, round_minor, Currency, CurrencyPair, Money};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::error::{FxError, FxResult};
use crate::fee::{FeePolicy, PercentageFeePolicy};
use crate::quote::{Quote, Valuation};
use crate::rate_table::{RateLookup, RateSource, RateTable, StaticRateTable};

/// Configuration for the conversion engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FxEngineConfig {
    /// Fraction of the amount charged as fee.
    pub fee_rate: Decimal,
    /// Absolute fee floor in source-currency units.
    pub minimum_fee: Decimal,
    /// Quote unknown pairs at the 1.0 fallback instead of rejecting them.
    pub allow_unknown_pairs: bool,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self {
            fee_rate: PercentageFeePolicy::STANDARD_RATE,
            minimum_fee: PercentageFeePolicy::STANDARD_MINIMUM,
            allow_unknown_pairs: false,
        }
    }
}

impl FxEngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(rate) = std::env::var("MONIEKING_FEE_RATE") {
            match rate.parse() {
                Ok(rate) => config.fee_rate = rate,
                Err(_) => warn!(value = %rate, "Ignoring unparseable MONIEKING_FEE_RATE"),
            }
        }

        if let Ok(minimum) = std::env::var("MONIEKING_MINIMUM_FEE") {
            match minimum.parse() {
                Ok(minimum) => config.minimum_fee = minimum,
                Err(_) => warn!(value = %minimum, "Ignoring unparseable MONIEKING_MINIMUM_FEE"),
            }
        }

        if let Ok(allow) = std::env::var("MONIEKING_ALLOW_UNKNOWN_PAIRS") {
            config.allow_unknown_pairs = matches!(allow.as_str(), "1" | "true" | "yes");
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        PercentageFeePolicy::new(self.fee_rate, self.minimum_fee).map(|_| ())
    }
}

/// Quotes conversions. Pure: holds no mutable state.
pub struct ConversionEngine {
    rates: Arc<dyn RateTable>,
    fees: Arc<dyn FeePolicy>,
    allow_unknown_pairs: bool,
}

impl ConversionEngine {
    /// Create an engine from explicit strategies. Unknown pairs are rejected.
    pub fn new(rates: Arc<dyn RateTable>, fees: Arc<dyn FeePolicy>) -> Self {
        Self {
            rates,
            fees,
            allow_unknown_pairs: false,
        }
    }

    /// Standard table with the percentage fee policy from `config`.
    pub fn from_config(config: &FxEngineConfig) -> FxResult<Self> {
        let fees = PercentageFeePolicy::new(config.fee_rate, config.minimum_fee)?;
        Ok(Self::new(Arc::new(StaticRateTable::standard()), Arc::new(fees))
            .with_unknown_pairs(config.allow_unknown_pairs))
    }

    /// Standard table and standard fees.
    pub fn standard() -> Self {
        Self::new(
            Arc::new(StaticRateTable::standard()),
            Arc::new(PercentageFeePolicy::standard()),
        )
    }

    /// Toggle the permissive 1.0 fallback for unknown pairs.
    pub fn with_unknown_pairs(mut self, allow: bool) -> Self {
        self.allow_unknown_pairs = allow;
        self
    }

    pub fn rate_table(&self) -> &dyn RateTable {
        self.rates.as_ref()
    }

    /// Fee on `amount` under the configured policy.
    pub fn fee(&self, amount: Decimal) -> FxResult<Decimal> {
        self.fees.fee(amount)
    }

    /// Quote converting `amount` of `from` into `to`.
    ///
    /// `amount` must be at least one minor unit with no finer digits.
    #[instrument(level = "debug", skip_all, fields(amount = %amount, from = %from, to = %to))]
    pub fn quote(&self, amount: Decimal, from: &Currency, to: &Currency) -> FxResult<Quote> {
        if !is_valid_amount(amount) {
            return Err(FxError::InvalidAmount(amount));
        }

        let fee = self.fees.fee(amount)?;
        let net = amount - fee;
        if net <= Decimal::ZERO {
            return Err(FxError::InsufficientAmount { amount, fee });
        }

        let lookup = self.accepted_rate(from, to)?;
        let converted = net
            .checked_mul(lookup.rate)
            .map(round_minor)
            .ok_or(FxError::AmountOverflow)?;

        debug!(
            fee = %fee,
            net = %net,
            rate = %lookup.rate,
            converted = %converted,
            "Quoted conversion"
        );

        Ok(Quote {
            gross_amount: Money::new(amount, from.clone()),
            fee: Money::new(fee, from.clone()),
            net_amount: Money::new(net, from.clone()),
            converted_amount: Money::new(converted, to.clone()),
            rate_used: lookup.rate,
            rate_source: lookup.source,
        })
    }

    /// Value `holdings` in `base` at table rates, charging no fee.
    ///
    /// Each holding is rounded to minor units before summing. Unknown pairs
    /// follow the same policy as [`ConversionEngine::quote`].
    #[instrument(level = "debug", skip_all, fields(base = %base, holdings = holdings.len()))]
    pub fn valuation(&self, holdings: &[Money], base: &Currency) -> FxResult<Valuation> {
        let mut total = Decimal::ZERO;
        let mut fallback_currencies = Vec::new();

        for holding in holdings {
            let lookup = self.accepted_rate(&holding.currency, base)?;
            if lookup.source.is_low_confidence() {
                fallback_currencies.push(holding.currency.clone());
            }
            let converted = holding
                .value
                .checked_mul(lookup.rate)
                .ok_or(FxError::AmountOverflow)?;
            total = total
                .checked_add(round_minor(converted))
                .ok_or(FxError::AmountOverflow)?;
        }

        Ok(Valuation {
            total: Money::new(total, base.clone()),
            fallback_currencies,
        })
    }

    /// Rate for a pair, rejecting the fallback unless unknown pairs are allowed.
    fn accepted_rate(&self, from: &Currency, to: &Currency) -> FxResult<RateLookup> {
        let lookup = self.rates.lookup(from, to);
        if lookup.source == RateSource::Fallback {
            let pair = CurrencyPair::new(from.clone(), to.clone());
            if !self.allow_unknown_pairs {
                return Err(FxError::UnknownCurrencyPair(pair));
            }
            warn!(table = %self.rates.name(), pair = %pair, "No configured rate, using 1.0 fallback");
        }
        Ok(lookup)
    }
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::standard()
    }
}
