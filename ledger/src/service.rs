//! Session-gated wallet service exposed to UI shells.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use monieking_common::{
    Clock, Currency, Money, ProductId, TransactionId, WalletError, WalletId, WalletResult,
};
use monieking_fx::{ConversionEngine, Quote, Valuation};

use crate::catalog::{Catalog, Product};
use crate::config::LedgerConfig;
use crate::engine::Ledger;
use crate::recorder::TransactionIdGenerator;
use crate::session::Session;
use crate::transaction::{SettleOutcome, Transaction};
use crate::wallet::Wallet;

/// Wallet operations on behalf of a logged-in session.
///
/// Mutating calls check the session first; an expired session fails with
/// `SessionExpired` before any balance is touched.
pub struct WalletService {
    ledger: Arc<Ledger>,
    catalog: Catalog,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl WalletService {
    /// Build a service with its own ledger.
    pub fn new(config: LedgerConfig, catalog: Catalog, clock: Arc<dyn Clock>) -> WalletResult<Self> {
        config.validate()?;
        let engine = Arc::new(ConversionEngine::from_config(&config.fx)?);
        let ledger = Arc::new(Ledger::new(engine, clock.clone()));
        Ok(Self::with_ledger(ledger, config, catalog, clock))
    }

    /// Build a service with reproducible transaction ids.
    pub fn seeded(
        config: LedgerConfig,
        catalog: Catalog,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> WalletResult<Self> {
        config.validate()?;
        let engine = Arc::new(ConversionEngine::from_config(&config.fx)?);
        let ids = TransactionIdGenerator::seeded(clock.clone(), seed);
        let ledger = Arc::new(Ledger::with_id_generator(engine, clock.clone(), ids));
        Ok(Self::with_ledger(ledger, config, catalog, clock))
    }

    /// Wrap an existing ledger.
    pub fn with_ledger(
        ledger: Arc<Ledger>,
        config: LedgerConfig,
        catalog: Catalog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            clock,
            config,
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Open a wallet with opening balances.
    pub fn open_wallet(
        &self,
        owner: &str,
        opening: impl IntoIterator<Item = Money>,
    ) -> WalletResult<WalletId> {
        self.ledger.open_wallet(owner, opening)
    }

    /// Start a session for an existing wallet.
    pub fn login(&self, wallet_id: WalletId) -> WalletResult<Session> {
        if !self.ledger.contains_wallet(wallet_id) {
            return Err(WalletError::WalletNotFound(wallet_id));
        }
        Ok(Session::login(
            wallet_id,
            self.clock.now(),
            self.config.session_idle_timeout,
        ))
    }

    /// Read-only preview; needs no session.
    pub fn quote(&self, amount: Decimal, from: &Currency, to: &Currency) -> WalletResult<Quote> {
        Ok(self.ledger.engine().quote(amount, from, to)?)
    }

    /// Apply a confirmed conversion.
    #[instrument(skip(self, session))]
    pub fn convert_and_apply(
        &self,
        session: &mut Session,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
    ) -> WalletResult<Transaction> {
        let wallet_id = self.authorize(session)?;
        self.ledger.convert_and_apply(wallet_id, amount, from, to)
    }

    pub fn get_wallet(&self, session: &mut Session) -> WalletResult<Wallet> {
        let wallet_id = self.authorize(session)?;
        self.ledger.get_wallet(wallet_id)
    }

    /// Every balance of the session wallet valued in `base`.
    pub fn total_balance(&self, session: &mut Session, base: &Currency) -> WalletResult<Valuation> {
        let wallet_id = self.authorize(session)?;
        self.ledger.total_value(wallet_id, base)
    }

    /// Time left on `session` before it idles out.
    pub fn session_time_remaining(&self, session: &Session) -> chrono::Duration {
        session.time_remaining(self.clock.now())
    }

    pub fn list_transactions(&self, session: &mut Session) -> WalletResult<Vec<Transaction>> {
        let wallet_id = self.authorize(session)?;
        self.ledger.list_transactions(wallet_id)
    }

    #[instrument(skip(self, session))]
    pub fn send(
        &self,
        session: &mut Session,
        amount: Money,
        recipient: &str,
        description: Option<String>,
    ) -> WalletResult<Transaction> {
        let wallet_id = self.authorize(session)?;
        self.ledger.send(wallet_id, amount, recipient, description)
    }

    #[instrument(skip(self, session))]
    pub fn receive(
        &self,
        session: &mut Session,
        amount: Money,
        sender: &str,
        description: Option<String>,
    ) -> WalletResult<Transaction> {
        let wallet_id = self.authorize(session)?;
        self.ledger.receive(wallet_id, amount, sender, description)
    }

    /// Buy a catalog product at its list price.
    #[instrument(skip(self, session))]
    pub fn purchase(&self, session: &mut Session, product_id: ProductId) -> WalletResult<Transaction> {
        let wallet_id = self.authorize(session)?;
        let product = self.product_for_sale(product_id)?;

        info!(product = %product.name, price = %product.price, "Purchasing product");
        self.ledger.pay(
            wallet_id,
            product.price.clone(),
            &product.brand,
            Some(product.name.clone()),
        )
    }

    /// Settle one of the session wallet's pending transactions.
    pub fn settle(
        &self,
        session: &mut Session,
        tx_id: &TransactionId,
        outcome: SettleOutcome,
    ) -> WalletResult<Transaction> {
        let wallet_id = self.authorize(session)?;
        if self.ledger.owner_of(tx_id)? != wallet_id {
            return Err(WalletError::NotFound(tx_id.clone()));
        }
        self.ledger.settle(tx_id, outcome)
    }

    fn product_for_sale(&self, product_id: ProductId) -> WalletResult<&Product> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or(WalletError::ProductNotFound(product_id))?;
        if !product.in_stock {
            return Err(WalletError::ProductUnavailable(product_id));
        }
        Ok(product)
    }

    fn authorize(&self, session: &mut Session) -> WalletResult<WalletId> {
        session.authorize(self.clock.now())
    }
}
