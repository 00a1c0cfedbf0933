//! Transfer log keyed by caller-supplied idempotency tokens.

use franchise_types::{Lamports, Timestamp, TransferResult, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// One transfer attempt, reserved before submission and settled after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLogEntry {
    pub idempotency_key: String,
    pub source: WalletAddress,
    pub destinations: Vec<WalletAddress>,
    pub total: Lamports,
    pub description: String,
    /// `None` while the attempt is in flight.
    pub result: Option<TransferResult>,
    pub created_at: Timestamp,
}

impl TransferLogEntry {
    /// Settled with a definite outcome (confirmed or failed).
    pub fn is_settled(&self) -> bool {
        self.result.as_ref().is_some_and(|r| !r.is_ambiguous())
    }
}

/// Trait for the idempotency log.
pub trait TransferLogStore {
    fn get_entry(&self, key: &str) -> Result<Option<TransferLogEntry>, StoreError>;

    /// Insert `entry` unless its key exists. Returns `false` if it did.
    fn reserve(&self, entry: &TransferLogEntry) -> Result<bool, StoreError>;

    /// Attach the outcome to a reserved entry.
    fn settle(&self, key: &str, result: &TransferResult) -> Result<(), StoreError>;

    /// Remove an entry so the key can be retried. Operators call this only
    /// after reconciliation shows the transfer did not land.
    fn release(&self, key: &str) -> Result<(), StoreError>;
}
