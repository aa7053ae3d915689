//! Core ledger implementation.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use monieking_common::{
    ensure_valid_amount, Clock, Currency, Money, Timestamp, TransactionId, WalletError, WalletId,
    WalletResult,
};
use monieking_fx::{ConversionEngine, Quote, Valuation};

use crate::recorder::{TransactionIdGenerator, TransactionLog};
use crate::transaction::{SettleOutcome, Transaction, TransactionMetadata, TransactionType};
use crate::wallet::Wallet;

/// A wallet together with its history, guarded by one lock.
struct WalletState {
    wallet: Wallet,
    log: TransactionLog,
}

/// In-memory multi-wallet ledger.
///
/// Every operation on a wallet runs under that wallet's mutex, so the debit
/// and credit of a conversion never interleave with other operations on the
/// same wallet. Different wallets do not contend.
pub struct Ledger {
    engine: Arc<ConversionEngine>,
    clock: Arc<dyn Clock>,
    ids: TransactionIdGenerator,
    wallets: DashMap<WalletId, Arc<Mutex<WalletState>>>,
    /// Routes `settle` calls to the owning wallet.
    index: DashMap<TransactionId, WalletId>,
}

impl Ledger {
    /// Create a new ledger.
    pub fn new(engine: Arc<ConversionEngine>, clock: Arc<dyn Clock>) -> Self {
        let ids = TransactionIdGenerator::new(clock.clone());
        Self::with_id_generator(engine, clock, ids)
    }

    /// Create a ledger with an explicit id generator.
    pub fn with_id_generator(
        engine: Arc<ConversionEngine>,
        clock: Arc<dyn Clock>,
        ids: TransactionIdGenerator,
    ) -> Self {
        Self {
            engine,
            clock,
            ids,
            wallets: DashMap::new(),
            index: DashMap::new(),
        }
    }

    pub fn engine(&self) -> &ConversionEngine {
        &self.engine
    }

    /// Open a wallet with opening balances. Negative balances are rejected.
    #[instrument(skip(self, opening))]
    pub fn open_wallet(
        &self,
        owner: &str,
        opening: impl IntoIterator<Item = Money>,
    ) -> WalletResult<WalletId> {
        let id = WalletId::new();
        let mut wallet = Wallet::new(id, owner.to_string(), self.clock.now());
        for amount in opening {
            wallet.fund(&amount)?;
        }

        self.wallets.insert(
            id,
            Arc::new(Mutex::new(WalletState {
                wallet,
                log: TransactionLog::new(),
            })),
        );

        info!(wallet_id = %id, owner = %owner, "Opened wallet");
        Ok(id)
    }

    pub fn contains_wallet(&self, wallet_id: WalletId) -> bool {
        self.wallets.contains_key(&wallet_id)
    }

    /// Snapshot of a wallet. Changing the copy does not affect the ledger.
    pub fn get_wallet(&self, wallet_id: WalletId) -> WalletResult<Wallet> {
        self.with_wallet(wallet_id, |state| Ok(state.wallet.clone()))
    }

    /// Total of every balance expressed in `base`, without fees.
    pub fn total_value(&self, wallet_id: WalletId, base: &Currency) -> WalletResult<Valuation> {
        let holdings = self.with_wallet(wallet_id, |state| Ok(state.wallet.balances()))?;
        Ok(self.engine.valuation(&holdings, base)?)
    }

    /// Transaction history, newest first.
    pub fn list_transactions(&self, wallet_id: WalletId) -> WalletResult<Vec<Transaction>> {
        self.with_wallet(wallet_id, |state| Ok(state.log.newest_first()))
    }

    /// Look up a single transaction.
    pub fn transaction(&self, tx_id: &TransactionId) -> WalletResult<Transaction> {
        let wallet_id = self.owner_of(tx_id)?;
        self.with_wallet(wallet_id, |state| {
            state
                .log
                .get(tx_id)
                .cloned()
                .ok_or_else(|| WalletError::NotFound(tx_id.clone()))
        })
    }

    /// Wallet that recorded `tx_id`.
    pub fn owner_of(&self, tx_id: &TransactionId) -> WalletResult<WalletId> {
        self.index
            .get(tx_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| WalletError::NotFound(tx_id.clone()))
    }

    /// Debit a wallet (reduce balance). Returns the new balance.
    #[instrument(skip(self))]
    pub fn debit(
        &self,
        wallet_id: WalletId,
        currency: &Currency,
        amount: Decimal,
    ) -> WalletResult<Decimal> {
        let at = self.clock.now();
        let balance = self.with_wallet(wallet_id, |state| state.wallet.debit(currency, amount, at))?;

        info!(wallet_id = %wallet_id, currency = %currency, amount = %amount, balance = %balance, "Debited wallet");
        Ok(balance)
    }

    /// Credit a wallet (increase balance). Returns the new balance.
    #[instrument(skip(self))]
    pub fn credit(
        &self,
        wallet_id: WalletId,
        currency: &Currency,
        amount: Decimal,
    ) -> WalletResult<Decimal> {
        let at = self.clock.now();
        let balance =
            self.with_wallet(wallet_id, |state| state.wallet.credit(currency, amount, at))?;

        info!(wallet_id = %wallet_id, currency = %currency, amount = %amount, balance = %balance, "Credited wallet");
        Ok(balance)
    }

    /// Record a pending transaction without touching balances.
    #[instrument(skip(self, metadata))]
    pub fn record(
        &self,
        wallet_id: WalletId,
        tx_type: TransactionType,
        amount: Money,
        metadata: TransactionMetadata,
    ) -> WalletResult<Transaction> {
        self.with_wallet(wallet_id, |state| {
            Ok(self.record_locked(state, tx_type, amount, metadata))
        })
    }

    /// Settle a pending transaction as completed or failed.
    #[instrument(skip(self))]
    pub fn settle(&self, tx_id: &TransactionId, outcome: SettleOutcome) -> WalletResult<Transaction> {
        let wallet_id = self.owner_of(tx_id)?;
        let at = self.clock.now();

        self.with_wallet(wallet_id, |state| {
            let tx = state.log.get_mut(tx_id)?;
            tx.settle(outcome, at)?;
            info!(tx_id = %tx_id, status = ?tx.status, "Settled transaction");
            Ok(tx.clone())
        })
    }

    /// Quote, then debit the source and credit the destination as one unit.
    ///
    /// On failure after the quote the balances are left untouched and the
    /// recorded Convert transaction is settled as failed.
    #[instrument(skip(self))]
    pub fn convert_and_apply(
        &self,
        wallet_id: WalletId,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
    ) -> WalletResult<Transaction> {
        let quote = self.engine.quote(amount, from, to)?;
        let at = self.clock.now();

        self.with_wallet(wallet_id, |state| {
            let tx = self.record_locked(
                state,
                TransactionType::Convert,
                quote.gross_amount.clone(),
                TransactionMetadata::conversion(&quote),
            );

            let applied = state
                .wallet
                .apply_atomically(|wallet| apply_conversion(wallet, &quote, at));

            self.finish(state, tx.id, applied)
        })
    }

    /// Send `amount` plus the fee to a recipient.
    #[instrument(skip(self))]
    pub fn send(
        &self,
        wallet_id: WalletId,
        amount: Money,
        recipient: &str,
        description: Option<String>,
    ) -> WalletResult<Transaction> {
        ensure_valid_amount(amount.value)?;
        let fee = self.engine.fee(amount.value)?;
        let total = amount
            .value
            .checked_add(fee)
            .ok_or(WalletError::AmountOverflow)?;
        let at = self.clock.now();

        self.with_wallet(wallet_id, |state| {
            let metadata = TransactionMetadata::to_recipient(recipient, description).with_fee(fee);
            let tx = self.record_locked(state, TransactionType::Send, amount.clone(), metadata);

            let applied = state
                .wallet
                .apply_atomically(|wallet| wallet.debit(&amount.currency, total, at).map(|_| ()));

            self.finish(state, tx.id, applied)
        })
    }

    /// Pay a fixed price without a fee, e.g. a catalog purchase.
    #[instrument(skip(self))]
    pub fn pay(
        &self,
        wallet_id: WalletId,
        price: Money,
        merchant: &str,
        description: Option<String>,
    ) -> WalletResult<Transaction> {
        let at = self.clock.now();

        self.with_wallet(wallet_id, |state| {
            ensure_valid_amount(price.value)?;
            let metadata = TransactionMetadata::to_recipient(merchant, description);
            let tx = self.record_locked(state, TransactionType::Send, price.clone(), metadata);

            let applied = state
                .wallet
                .apply_atomically(|wallet| wallet.debit(&price.currency, price.value, at).map(|_| ()));

            self.finish(state, tx.id, applied)
        })
    }

    /// Receive `amount` from a sender.
    #[instrument(skip(self))]
    pub fn receive(
        &self,
        wallet_id: WalletId,
        amount: Money,
        sender: &str,
        description: Option<String>,
    ) -> WalletResult<Transaction> {
        ensure_valid_amount(amount.value)?;
        let at = self.clock.now();

        self.with_wallet(wallet_id, |state| {
            let metadata = TransactionMetadata::from_sender(sender, description);
            let tx = self.record_locked(state, TransactionType::Receive, amount.clone(), metadata);

            let applied = state
                .wallet
                .apply_atomically(|wallet| wallet.credit(&amount.currency, amount.value, at).map(|_| ()));

            self.finish(state, tx.id, applied)
        })
    }

    fn with_wallet<T>(
        &self,
        wallet_id: WalletId,
        f: impl FnOnce(&mut WalletState) -> WalletResult<T>,
    ) -> WalletResult<T> {
        let slot = self
            .wallets
            .get(&wallet_id)
            .map(|entry| entry.value().clone())
            .ok_or(WalletError::WalletNotFound(wallet_id))?;

        let mut state = slot.lock();
        f(&mut state)
    }

    fn record_locked(
        &self,
        state: &mut WalletState,
        tx_type: TransactionType,
        amount: Money,
        metadata: TransactionMetadata,
    ) -> Transaction {
        let tx = Transaction::pending(
            self.ids.next_id(),
            state.wallet.id,
            tx_type,
            amount,
            metadata,
            self.clock.now(),
        );

        self.index.insert(tx.id.clone(), state.wallet.id);
        state.log.append(tx.clone());

        info!(
            tx_id = %tx.id,
            wallet_id = %tx.wallet_id,
            tx_type = ?tx.tx_type,
            amount = %tx.amount,
            currency = %tx.currency,
            "Recorded transaction"
        );
        tx
    }

    /// Settle the record created for an operation according to its result.
    fn finish(
        &self,
        state: &mut WalletState,
        tx_id: TransactionId,
        applied: WalletResult<()>,
    ) -> WalletResult<Transaction> {
        let at = self.clock.now();
        let tx = state.log.get_mut(&tx_id)?;

        match applied {
            Ok(()) => {
                tx.settle(SettleOutcome::Completed, at)?;
                info!(tx_id = %tx.id, "Transaction completed");
                Ok(tx.clone())
            }
            Err(err) => {
                tx.metadata.failure_reason = Some(err.to_string());
                tx.settle(SettleOutcome::Failed, at)?;
                warn!(tx_id = %tx.id, error = %err, "Transaction failed, balances unchanged");
                Err(err)
            }
        }
    }
}

fn apply_conversion(wallet: &mut Wallet, quote: &Quote, at: Timestamp) -> WalletResult<()> {
    wallet.debit(&quote.gross_amount.currency, quote.gross_amount.value, at)?;
    wallet.credit(
        &quote.converted_amount.currency,
        quote.converted_amount.value,
        at,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionStatus;
    use monieking_common::{now, ManualClock};
    use rust_decimal_macros::dec;

    fn setup() -> (Ledger, WalletId) {
        let clock = Arc::new(ManualClock::new(now()));
        let ids = TransactionIdGenerator::seeded(clock.clone(), 42);
        let ledger =
            Ledger::with_id_generator(Arc::new(ConversionEngine::standard()), clock, ids);
        let wallet_id = ledger
            .open_wallet(
                "Wisdom Okechukwu",
                [
                    Money::new(dec!(1250.00), Currency::usd()),
                    Money::new(dec!(640.00), Currency::eur()),
                    Money::new(dec!(320.50), Currency::gbp()),
                    Money::new(dec!(580000), Currency::ngn()),
                ],
            )
            .unwrap();
        (ledger, wallet_id)
    }

    #[test]
    fn test_convert_and_apply_updates_both_balances() {
        let (ledger, wallet_id) = setup();

        let tx = ledger
            .convert_and_apply(wallet_id, dec!(100), &Currency::usd(), &Currency::eur())
            .unwrap();

        let wallet = ledger.get_wallet(wallet_id).unwrap();
        assert_eq!(wallet.balance(&Currency::usd()), dec!(1150.00));
        assert_eq!(wallet.balance(&Currency::eur()), dec!(730.62));
        assert_eq!(tx.tx_type, TransactionType::Convert);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.metadata.fee, Some(dec!(1.50)));
        assert_eq!(
            tx.metadata.converted_amount,
            Some(Money::new(dec!(90.62), Currency::eur()))
        );
    }

    #[test]
    fn test_convert_rolls_back_when_credit_fails() {
        let (ledger, wallet_id) = setup();
        let before = ledger.get_wallet(wallet_id).unwrap();

        // 2 NGN: fee 1, net 1 * 0.00061 rounds to 0.00 USD, so the credit fails
        let result =
            ledger.convert_and_apply(wallet_id, dec!(2), &Currency::ngn(), &Currency::usd());

        assert!(matches!(result, Err(WalletError::InvalidAmount(_))));
        let after = ledger.get_wallet(wallet_id).unwrap();
        assert_eq!(after.balance(&Currency::ngn()), before.balance(&Currency::ngn()));
        assert_eq!(after.balance(&Currency::usd()), before.balance(&Currency::usd()));

        let history = ledger.list_transactions(wallet_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, TransactionStatus::Failed);
        assert!(history[0].metadata.failure_reason.is_some());
    }

    #[test]
    fn test_injected_failure_after_debit_restores_source() {
        let (ledger, wallet_id) = setup();
        let quote = ledger
            .engine()
            .quote(dec!(100), &Currency::usd(), &Currency::eur())
            .unwrap();

        let result: WalletResult<()> = ledger.with_wallet(wallet_id, |state| {
            state.wallet.apply_atomically(|wallet| {
                wallet.debit(&Currency::usd(), quote.gross_amount.value, now())?;
                Err(WalletError::InvalidAmount("injected".into()))
            })
        });

        assert!(result.is_err());
        let wallet = ledger.get_wallet(wallet_id).unwrap();
        assert_eq!(wallet.balance(&Currency::usd()), dec!(1250.00));
        assert_eq!(wallet.balance(&Currency::eur()), dec!(640.00));
    }

    #[test]
    fn test_convert_insufficient_funds_leaves_balances() {
        let (ledger, wallet_id) = setup();

        let result =
            ledger.convert_and_apply(wallet_id, dec!(5000), &Currency::usd(), &Currency::eur());

        assert!(matches!(result, Err(WalletError::InsufficientFunds { .. })));
        let wallet = ledger.get_wallet(wallet_id).unwrap();
        assert_eq!(wallet.balance(&Currency::usd()), dec!(1250.00));
        assert_eq!(wallet.balance(&Currency::eur()), dec!(640.00));
    }

    #[test]
    fn test_quote_errors_record_nothing() {
        let (ledger, wallet_id) = setup();

        let result =
            ledger.convert_and_apply(wallet_id, dec!(0.50), &Currency::usd(), &Currency::eur());

        assert!(matches!(result, Err(WalletError::InsufficientAmount { .. })));
        assert!(ledger.list_transactions(wallet_id).unwrap().is_empty());
    }

    #[test]
    fn test_debit_beyond_balance_rejected() {
        let (ledger, wallet_id) = setup();

        let result = ledger.debit(wallet_id, &Currency::usd(), dec!(1250.01));

        assert!(matches!(result, Err(WalletError::InsufficientFunds { .. })));
        assert_eq!(
            ledger.get_wallet(wallet_id).unwrap().balance(&Currency::usd()),
            dec!(1250.00)
        );
    }

    #[test]
    fn test_debit_credit_round_trip() {
        let (ledger, wallet_id) = setup();

        ledger.debit(wallet_id, &Currency::gbp(), dec!(75)).unwrap();
        let balance = ledger.credit(wallet_id, &Currency::gbp(), dec!(75)).unwrap();

        assert_eq!(balance, dec!(320.50));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let (ledger, wallet_id) = setup();

        let mut snapshot = ledger.get_wallet(wallet_id).unwrap();
        snapshot.debit(&Currency::usd(), dec!(50), now()).unwrap();

        let fresh = ledger.get_wallet(wallet_id).unwrap();
        assert_eq!(fresh.balance(&Currency::usd()), dec!(1250.00));
        assert_eq!(snapshot.balance(&Currency::usd()), dec!(1200.00));
    }

    #[test]
    fn test_send_debits_amount_plus_fee() {
        let (ledger, wallet_id) = setup();

        let tx = ledger
            .send(
                wallet_id,
                Money::new(dec!(200), Currency::usd()),
                "John Doe",
                Some("Payment for services".into()),
            )
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.metadata.fee, Some(dec!(3.00)));
        assert_eq!(
            ledger.get_wallet(wallet_id).unwrap().balance(&Currency::usd()),
            dec!(1047.00)
        );
    }

    #[test]
    fn test_failed_send_is_recorded() {
        let (ledger, wallet_id) = setup();

        let result = ledger.send(
            wallet_id,
            Money::new(dec!(1240), Currency::usd()),
            "Jane Wilson",
            None,
        );

        // 1240 + 18.60 fee exceeds 1250
        assert!(matches!(result, Err(WalletError::InsufficientFunds { .. })));
        let history = ledger.list_transactions(wallet_id).unwrap();
        assert_eq!(history[0].status, TransactionStatus::Failed);
        assert_eq!(
            ledger.get_wallet(wallet_id).unwrap().balance(&Currency::usd()),
            dec!(1250.00)
        );
    }

    #[test]
    fn test_send_fee_keeps_minor_units() {
        let (ledger, wallet_id) = setup();

        let tx = ledger
            .send(wallet_id, Money::new(dec!(75), Currency::gbp()), "Michael Brown", None)
            .unwrap();

        assert_eq!(tx.metadata.fee, Some(dec!(1.13)));
        assert_eq!(
            ledger.get_wallet(wallet_id).unwrap().balance(&Currency::gbp()),
            dec!(244.37)
        );
    }

    #[test]
    fn test_sub_minor_amounts_record_nothing() {
        let (ledger, wallet_id) = setup();

        let send = ledger.send(wallet_id, Money::new(dec!(0.001), Currency::usd()), "John Doe", None);
        let receive =
            ledger.receive(wallet_id, Money::new(dec!(5.555), Currency::eur()), "Sarah Smith", None);
        let convert =
            ledger.convert_and_apply(wallet_id, dec!(10.005), &Currency::usd(), &Currency::eur());

        assert!(matches!(send, Err(WalletError::InvalidAmount(_))));
        assert!(matches!(receive, Err(WalletError::InvalidAmount(_))));
        assert!(matches!(convert, Err(WalletError::InvalidAmount(_))));
        assert!(matches!(
            ledger.debit(wallet_id, &Currency::usd(), dec!(0.005)),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(ledger.list_transactions(wallet_id).unwrap().is_empty());
    }

    #[test]
    fn test_overflowing_conversion_records_nothing() {
        let (ledger, wallet_id) = setup();
        let amount = Decimal::from_i128_with_scale(10i128.pow(26), 0);

        let result = ledger.convert_and_apply(wallet_id, amount, &Currency::gbp(), &Currency::ngn());

        assert_eq!(result, Err(WalletError::AmountOverflow));
        assert!(ledger.list_transactions(wallet_id).unwrap().is_empty());
    }

    #[test]
    fn test_receive_overflow_settles_failed() {
        let (ledger, _) = setup();
        let wallet_id = ledger
            .open_wallet("Tech Corp Ltd", [Money::new(Decimal::MAX, Currency::usd())])
            .unwrap();

        let result = ledger.receive(wallet_id, Money::new(dec!(1), Currency::usd()), "Sarah Smith", None);

        assert_eq!(result, Err(WalletError::AmountOverflow));
        let history = ledger.list_transactions(wallet_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, TransactionStatus::Failed);
        assert_eq!(
            ledger.get_wallet(wallet_id).unwrap().balance(&Currency::usd()),
            Decimal::MAX
        );
    }

    #[test]
    fn test_total_value() {
        let (ledger, wallet_id) = setup();

        let valuation = ledger.total_value(wallet_id, &Currency::usd()).unwrap();

        assert_eq!(valuation.total, Money::new(dec!(2708.44), Currency::usd()));
        assert!(!valuation.is_low_confidence());

        let missing = WalletId::new();
        assert_eq!(
            ledger.total_value(missing, &Currency::usd()),
            Err(WalletError::WalletNotFound(missing))
        );
    }

    #[test]
    fn test_receive_and_history_order() {
        let (ledger, wallet_id) = setup();

        ledger
            .receive(wallet_id, Money::new(dec!(150), Currency::eur()), "Sarah Smith", None)
            .unwrap();
        ledger
            .receive(wallet_id, Money::new(dec!(300), Currency::usd()), "Tech Corp Ltd", None)
            .unwrap();

        let history = ledger.list_transactions(wallet_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].currency, Currency::usd());
        assert_eq!(history[1].metadata.sender.as_deref(), Some("Sarah Smith"));
        assert_eq!(
            ledger.get_wallet(wallet_id).unwrap().balance(&Currency::eur()),
            dec!(790.00)
        );
    }

    #[test]
    fn test_record_and_settle() {
        let (ledger, wallet_id) = setup();

        let tx = ledger
            .record(
                wallet_id,
                TransactionType::Send,
                Money::new(dec!(500), Currency::usd()),
                TransactionMetadata::to_recipient("Jane Wilson", None),
            )
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);

        let settled = ledger.settle(&tx.id, SettleOutcome::Failed).unwrap();
        assert_eq!(settled.status, TransactionStatus::Failed);
        assert_eq!(ledger.transaction(&tx.id).unwrap().status, TransactionStatus::Failed);

        assert_eq!(
            ledger.settle(&tx.id, SettleOutcome::Completed),
            Err(WalletError::AlreadySettled(tx.id.clone()))
        );
        assert!(matches!(
            ledger.settle(&TransactionId::new("TXN404"), SettleOutcome::Completed),
            Err(WalletError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_wallet() {
        let (ledger, _) = setup();
        let missing = WalletId::new();

        assert_eq!(
            ledger.get_wallet(missing),
            Err(WalletError::WalletNotFound(missing))
        );
    }

    #[test]
    fn test_concurrent_conversions_lose_no_updates() {
        let (ledger, wallet_id) = setup();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        ledger
                            .convert_and_apply(
                                wallet_id,
                                dec!(10),
                                &Currency::usd(),
                                &Currency::eur(),
                            )
                            .unwrap();
                    }
                });
            }
        });

        // each: debit 10 USD, credit (10 - 1) * 0.92 = 8.28 EUR
        let wallet = ledger.get_wallet(wallet_id).unwrap();
        assert_eq!(wallet.balance(&Currency::usd()), dec!(450.00));
        assert_eq!(wallet.balance(&Currency::eur()), dec!(1302.40));
        assert_eq!(ledger.list_transactions(wallet_id).unwrap().len(), 80);
    }
}
