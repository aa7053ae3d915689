//! MonieKing Wallet Ledger
//!
//! In-memory multi-currency wallets with atomic conversions, an append-only
//! transaction history and a session-gated service for UI shells.

pub mod engine;
pub mod wallet;
pub mod transaction;
pub mod recorder;
pub mod session;
pub mod catalog;
pub mod config;
pub mod service;

pub use engine::Ledger;
pub use wallet::Wallet;
pub use transaction::{
    SettleOutcome, Transaction, TransactionMetadata, TransactionStatus, TransactionType,
};
pub use recorder::{TransactionIdGenerator, TransactionLog};
pub use session::Session;
pub use catalog::{Catalog, Product};
pub use config::LedgerConfig;
pub use service::WalletService;
