//! MonieKing FX Engine
//!
//! Rate lookup, fee computation and conversion quotes.
//!
//! # Features
//!
//! - Pluggable rate tables with a standard USD/EUR/GBP/NGN table
//! - Percentage fee policy with an absolute floor
//! - Deterministic quotes rounded to minor units
//! - Fail-closed handling of unknown currency pairs, with an opt-in fallback
//!
//! # Example
//!
//! ```rust,ignore
//! use monieking_fx::ConversionEngine;
//! use monieking_common::Currency;
//! use rust_decimal_macros::dec;
//!
//! let engine = ConversionEngine::standard();
//! let quote = engine.quote(dec!(100), &Currency::usd(), &Currency::eur())?;
//! assert_eq!(quote.converted_amount.value, dec!(90.62));
//! ```

pub mod engine;
pub mod rate_table;
pub mod fee;
pub mod quote;
pub mod error;

pub use engine::{ConversionEngine, FxEngineConfig};
pub use rate_table::{RateLookup, RateSource, RateTable, StaticRateTable};
pub use fee::{FeePolicy, PercentageFeePolicy};
pub use quote::{Quote, Valuation};
pub use error::{FxError, FxResult};
