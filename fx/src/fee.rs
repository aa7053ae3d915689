//! Fee policies applied to conversions and transfers.

use monieking_common::MINOR_UNIT_DP;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// Trait for fee policies. Fees are in source-currency units.
pub trait FeePolicy: Send + Sync {
    /// Fee charged on `amount`.
    fn fee(&self, amount: Decimal) -> FxResult<Decimal>;
}

/// Percentage fee with an absolute floor: `max(amount * rate, minimum)`.
///
/// The result is rounded up to the minor unit, so it never falls below
/// `amount * rate` and balances keep two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentageFeePolicy {
    rate: Decimal,
    minimum: Decimal,
}

impl PercentageFeePolicy {
    /// Standard fee rate (1.5%).
    pub const STANDARD_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 3);
    /// Standard minimum fee (1.00).
    pub const STANDARD_MINIMUM: Decimal = Decimal::ONE;

    pub fn new(rate: Decimal, minimum: Decimal) -> FxResult<Self> {
        if rate < Decimal::ZERO || rate >= Decimal::ONE {
            return Err(FxError::InvalidConfiguration(format!(
                "fee rate must be in [0, 1), got {}",
                rate
            )));
        }
        if minimum < Decimal::ZERO {
            return Err(FxError::InvalidConfiguration(format!(
                "minimum fee must not be negative, got {}",
                minimum
            )));
        }
        Ok(Self { rate, minimum })
    }

    pub fn standard() -> Self {
        Self {
            rate: Self::STANDARD_RATE,
            minimum: Self::STANDARD_MINIMUM,
        }
    }
}

impl Default for PercentageFeePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeePolicy for PercentageFeePolicy {
    fn fee(&self, amount: Decimal) -> FxResult<Decimal> {
        if amount < Decimal::ZERO {
            return Err(FxError::InvalidAmount(amount));
        }
        let percentage = amount
            .checked_mul(self.rate)
            .ok_or(FxError::AmountOverflow)?;
        Ok(percentage
            .max(self.minimum)
            .round_dp_with_strategy(MINOR_UNIT_DP, RoundingStrategy::AwayFromZero))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_standard_constants() {
        assert_eq!(PercentageFeePolicy::STANDARD_RATE, dec!(0.015));
        assert_eq!(PercentageFeePolicy::STANDARD_MINIMUM, dec!(1.00));
    }

    #[test]
    fn test_percentage_above_floor() {
        let policy = PercentageFeePolicy::standard();
        assert_eq!(policy.fee(dec!(100)).unwrap(), dec!(1.5));
        assert_eq!(policy.fee(dec!(1000)).unwrap(), dec!(15));
    }

    #[test]
    fn test_fee_rounds_up_to_minor_unit() {
        let policy = PercentageFeePolicy::standard();
        assert_eq!(policy.fee(dec!(75)).unwrap(), dec!(1.13));
        assert_eq!(policy.fee(dec!(100.33)).unwrap(), dec!(1.51));
        assert_eq!(policy.fee(dec!(500)).unwrap(), dec!(7.50));
    }

    #[test]
    fn test_floor_applies_to_small_amounts() {
        let policy = PercentageFeePolicy::standard();
        assert_eq!(policy.fee(dec!(50)).unwrap(), dec!(1.00));
        assert_eq!(policy.fee(dec!(0)).unwrap(), dec!(1.00));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let policy = PercentageFeePolicy::standard();
        assert_eq!(policy.fee(dec!(-5)), Err(FxError::InvalidAmount(dec!(-5))));
    }

    #[test]
    fn test_invalid_policy_configuration() {
        assert!(PercentageFeePolicy::new(dec!(-0.01), dec!(1)).is_err());
        assert!(PercentageFeePolicy::new(dec!(1), dec!(1)).is_err());
        assert!(PercentageFeePolicy::new(dec!(0.02), dec!(-1)).is_err());
        assert!(PercentageFeePolicy::new(dec!(0.02), dec!(0.5)).is_ok());
    }

    proptest! {
        #[test]
        fn prop_fee_respects_floor_and_rate(cents in 1i64..1_000_000_000i64) {
            let amount = Decimal::new(cents, 2);
            let fee = PercentageFeePolicy::standard().fee(amount).unwrap();
            prop_assert!(fee >= dec!(1.00));
            prop_assert!(fee >= amount * dec!(0.015));
            prop_assert!(fee.normalize().scale() <= MINOR_UNIT_DP);
        }
    }
}
