//! Transaction records and their lifecycle.

use monieking_common::{
    Currency, Money, Timestamp, TransactionId, WalletError, WalletId, WalletResult,
};
use monieking_fx::Quote;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Send,
    Receive,
    Convert,
}

/// Transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Recorded, not yet settled.
    Pending,
    /// Settled successfully.
    Completed,
    /// Settled as failed.
    Failed,
}

impl TransactionStatus {
    /// Check if this is a final state.
    pub fn is_final(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }

    /// Get valid next states from current state.
    pub fn valid_transitions(&self) -> &[TransactionStatus] {
        match self {
            TransactionStatus::Pending => {
                &[TransactionStatus::Completed, TransactionStatus::Failed]
            }
            TransactionStatus::Completed | TransactionStatus::Failed => &[],
        }
    }

    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

/// Terminal outcome used to settle a pending transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettleOutcome {
    Completed,
    Failed,
}

impl From<SettleOutcome> for TransactionStatus {
    fn from(outcome: SettleOutcome) -> Self {
        match outcome {
            SettleOutcome::Completed => TransactionStatus::Completed,
            SettleOutcome::Failed => TransactionStatus::Failed,
        }
    }
}

/// Counterparties and conversion details attached to a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl TransactionMetadata {
    /// Metadata for an outgoing transfer.
    pub fn to_recipient(recipient: impl Into<String>, description: Option<String>) -> Self {
        Self {
            recipient: Some(recipient.into()),
            description,
            ..Default::default()
        }
    }

    /// Metadata for an incoming transfer.
    pub fn from_sender(sender: impl Into<String>, description: Option<String>) -> Self {
        Self {
            sender: Some(sender.into()),
            description,
            ..Default::default()
        }
    }

    /// Metadata describing a quoted conversion.
    pub fn conversion(quote: &Quote) -> Self {
        Self {
            description: Some("Currency conversion".to_string()),
            from: Some(quote.gross_amount.currency.clone()),
            to: Some(quote.converted_amount.currency.clone()),
            fee: Some(quote.fee.value),
            rate: Some(quote.rate_used),
            converted_amount: Some(quote.converted_amount.clone()),
            ..Default::default()
        }
    }

    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.fee = Some(fee);
        self
    }
}

/// An immutable wallet transaction; only its status changes, exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID.
    pub id: TransactionId,
    /// Wallet this transaction belongs to.
    pub wallet_id: WalletId,
    /// Send, receive or convert.
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Principal amount.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: Currency,
    /// When the transaction was recorded.
    pub created_at: Timestamp,
    /// Current status.
    pub status: TransactionStatus,
    /// When the transaction was settled.
    pub settled_at: Option<Timestamp>,
    /// Counterparties and details.
    pub metadata: TransactionMetadata,
}

impl Transaction {
    pub(crate) fn pending(
        id: TransactionId,
        wallet_id: WalletId,
        tx_type: TransactionType,
        amount: Money,
        metadata: TransactionMetadata,
        at: Timestamp,
    ) -> Self {
        Self {
            id,
            wallet_id,
            tx_type,
            amount: amount.value,
            currency: amount.currency,
            created_at: at,
            status: TransactionStatus::Pending,
            settled_at: None,
            metadata,
        }
    }

    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency.clone())
    }

    pub fn is_pending(&self) -> bool {
        !self.status.is_final()
    }

    /// Move from Pending to the terminal status for `outcome`.
    pub(crate) fn settle(&mut self, outcome: SettleOutcome, at: Timestamp) -> WalletResult<()> {
        let next = TransactionStatus::from(outcome);
        if !self.status.can_transition_to(next) {
            return Err(WalletError::AlreadySettled(self.id.clone()));
        }
        self.status = next;
        self.settled_at = Some(at);
        Ok(())
    }
}
