//! Wallet balances.

use std::collections::BTreeMap;

use monieking_common::{
    ensure_valid_amount, has_minor_unit_precision, Currency, Money, Timestamp, WalletError,
    WalletId, WalletResult,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's multi-currency wallet.
///
/// Values handed out by the ledger are snapshots; only the ledger mutates
/// the wallet it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet identifier.
    pub id: WalletId,
    /// Display name of the owner.
    pub owner: String,
    /// Non-negative balance per currency.
    balances: BTreeMap<Currency, Decimal>,
    /// When the wallet was opened.
    pub created_at: Timestamp,
    /// When a balance last changed.
    pub updated_at: Timestamp,
}

impl Wallet {
    pub(crate) fn new(id: WalletId, owner: String, at: Timestamp) -> Self {
        Self {
            id,
            owner,
            balances: BTreeMap::new(),
            created_at: at,
            updated_at: at,
        }
    }

    /// Balance held in `currency`; zero when the currency was never funded.
    pub fn balance(&self, currency: &Currency) -> Decimal {
        self.balances.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    /// All balances as money values, ordered by currency code.
    pub fn balances(&self) -> Vec<Money> {
        self.balances
            .iter()
            .map(|(currency, value)| Money::new(*value, currency.clone()))
            .collect()
    }

    pub fn has_sufficient_funds(&self, currency: &Currency, amount: Decimal) -> bool {
        self.balance(currency) >= amount
    }

    /// Subtract `amount`, rejecting (never clamping) overdrafts.
    pub(crate) fn debit(
        &mut self,
        currency: &Currency,
        amount: Decimal,
        at: Timestamp,
    ) -> WalletResult<Decimal> {
        ensure_valid_amount(amount)?;

        let available = self.balance(currency);
        if !self.has_sufficient_funds(currency, amount) {
            return Err(WalletError::InsufficientFunds {
                currency: currency.clone(),
                required: amount.to_string(),
                available: available.to_string(),
            });
        }

        let updated = available - amount;
        self.balances.insert(currency.clone(), updated);
        self.updated_at = at;
        Ok(updated)
    }

    /// Add `amount` to the balance.
    pub(crate) fn credit(
        &mut self,
        currency: &Currency,
        amount: Decimal,
        at: Timestamp,
    ) -> WalletResult<Decimal> {
        ensure_valid_amount(amount)?;

        let updated = self
            .balance(currency)
            .checked_add(amount)
            .ok_or(WalletError::AmountOverflow)?;
        self.balances.insert(currency.clone(), updated);
        self.updated_at = at;
        Ok(updated)
    }

    /// Seed an opening balance. Zero is allowed; negative amounts and
    /// digits below the minor unit are not.
    pub(crate) fn fund(&mut self, amount: &Money) -> WalletResult<()> {
        if amount.value < Decimal::ZERO || !has_minor_unit_precision(amount.value) {
            return Err(WalletError::InvalidAmount(amount.value.to_string()));
        }
        let updated = self
            .balance(&amount.currency)
            .checked_add(amount.value)
            .ok_or(WalletError::AmountOverflow)?;
        self.balances.insert(amount.currency.clone(), updated);
        Ok(())
    }

    /// Run `steps` as one unit: on error every balance is restored.
    pub(crate) fn apply_atomically<T>(
        &mut self,
        steps: impl FnOnce(&mut Wallet) -> WalletResult<T>,
    ) -> WalletResult<T> {
        let before = self.clone();
        match steps(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = before;
                Err(err)
            }
        }
    }
}
