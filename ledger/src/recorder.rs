//! Transaction identifiers and the per-wallet append-only history.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use monieking_common::{Clock, TransactionId, WalletError, WalletResult};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::transaction::Transaction;

/// Generates `TXN<millis><sequence><random>` identifiers.
///
/// The per-process sequence keeps ids unique even when the clock and the
/// random component repeat within a millisecond.
pub struct TransactionIdGenerator {
    clock: Arc<dyn Clock>,
    sequence: AtomicU64,
    rng: Mutex<StdRng>,
}

impl TransactionIdGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(clock, StdRng::from_entropy())
    }

    /// Reproducible ids for tests and replays.
    pub fn seeded(clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self::with_rng(clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        Self {
            clock,
            sequence: AtomicU64::new(0),
            rng: Mutex::new(rng),
        }
    }

    pub fn next_id(&self) -> TransactionId {
        let millis = self.clock.now().timestamp_millis();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let random: u16 = self.rng.lock().gen_range(0..1000);
        TransactionId::compose(millis, sequence, random)
    }
}

/// Append-only history of one wallet, in creation order.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    entries: Vec<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, tx: Transaction) {
        self.entries.push(tx);
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.entries.iter().rev().find(|tx| &tx.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &TransactionId) -> WalletResult<&mut Transaction> {
        self.entries
            .iter_mut()
            .rev()
            .find(|tx| &tx.id == id)
            .ok_or_else(|| WalletError::NotFound(id.clone()))
    }

    /// Owned snapshot, newest first.
    pub fn newest_first(&self) -> Vec<Transaction> {
        self.entries.iter().rev().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{TransactionMetadata, TransactionType};
    use monieking_common::{now, Currency, ManualClock, Money, WalletId};
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let clock = Arc::new(ManualClock::new(now()));
        let ids = TransactionIdGenerator::seeded(clock, 7);

        let generated: HashSet<TransactionId> = (0..1000).map(|_| ids.next_id()).collect();

        assert_eq!(generated.len(), 1000);
        assert!(generated.iter().all(|id| id.as_str().starts_with("TXN")));
    }

    #[test]
    fn test_id_embeds_clock_millis() {
        let start = now();
        let clock = Arc::new(ManualClock::new(start));
        let ids = TransactionIdGenerator::seeded(clock, 1);

        let id = ids.next_id();

        let prefix = format!("TXN{}000000", start.timestamp_millis());
        assert!(id.as_str().starts_with(&prefix));
    }

    #[test]
    fn test_log_newest_first_and_lookup() {
        let clock = Arc::new(ManualClock::new(now()));
        let ids = TransactionIdGenerator::seeded(clock, 3);
        let wallet_id = WalletId::new();
        let mut log = TransactionLog::new();

        for amount in [dec!(10), dec!(20), dec!(30)] {
            log.append(Transaction::pending(
                ids.next_id(),
                wallet_id,
                TransactionType::Receive,
                Money::new(amount, Currency::usd()),
                TransactionMetadata::from_sender("Tech Corp Ltd", None),
                now(),
            ));
        }

        let listed = log.newest_first();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].amount, dec!(30));
        assert_eq!(listed[2].amount, dec!(10));
        assert!(log.get(&listed[1].id).is_some());
        assert!(listed.iter().all(|tx| tx.is_pending()));
        assert!(matches!(
            log.get_mut(&TransactionId::new("TXN0")),
            Err(WalletError::NotFound(_))
        ));
    }
}
