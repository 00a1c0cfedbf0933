//! Nullable store: thread-safe in-memory storage for testing.

use franchise_store::{
    FundingRound, FundingRoundStore, StoreError, TransferLogEntry, TransferLogStore, WalletRecord,
    WalletRole, WalletStore,
};
use franchise_types::{Lamports, Timestamp, TransferResult, WalletAddress};
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory wallet, transfer-log and funding-round store.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    wallets: Mutex<HashMap<String, WalletRecord>>,
    transfers: Mutex<HashMap<String, TransferLogEntry>>,
    rounds: Mutex<HashMap<String, FundingRound>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            wallets: Mutex::new(HashMap::new()),
            transfers: Mutex::new(HashMap::new()),
            rounds: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a funding round (owned by the platform, read-only to the core).
    pub fn insert_round(&self, round: FundingRound) {
        self.rounds.lock().unwrap().insert(round.id.clone(), round);
    }

    /// Seed a wallet with a recorded balance.
    pub fn insert_wallet(&self, address: WalletAddress, role: WalletRole, recorded: Lamports) {
        let mut record = WalletRecord::new(address, role);
        record.recorded_balance = recorded;
        self.wallets
            .lock()
            .unwrap()
            .insert(record.address.to_string(), record);
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.lock().unwrap().len()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletStore for NullStore {
    fn get_wallet(&self, address: &WalletAddress) -> Result<Option<WalletRecord>, StoreError> {
        Ok(self.wallets.lock().unwrap().get(address.as_str()).cloned())
    }

    fn put_wallet(&self, record: &WalletRecord) -> Result<(), StoreError> {
        self.wallets
            .lock()
            .unwrap()
            .insert(record.address.to_string(), record.clone());
        Ok(())
    }

    fn update_recorded_balance(
        &self,
        address: &WalletAddress,
        balance: Lamports,
    ) -> Result<(), StoreError> {
        let mut wallets = self.wallets.lock().unwrap();
        let record = wallets
            .get_mut(address.as_str())
            .ok_or_else(|| StoreError::NotFound(address.to_string()))?;
        record.recorded_balance = balance;
        record.updated_at = Timestamp::now();
        Ok(())
    }

    fn wallets_by_role(&self, role: WalletRole) -> Result<Vec<WalletRecord>, StoreError> {
        let mut found: Vec<WalletRecord> = self
            .wallets
            .lock()
            .unwrap()
            .values()
            .filter(|w| w.role == role)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(found)
    }
}

impl TransferLogStore for NullStore {
    fn get_entry(&self, key: &str) -> Result<Option<TransferLogEntry>, StoreError> {
        Ok(self.transfers.lock().unwrap().get(key).cloned())
    }

    fn reserve(&self, entry: &TransferLogEntry) -> Result<bool, StoreError> {
        let mut transfers = self.transfers.lock().unwrap();
        if transfers.contains_key(&entry.idempotency_key) {
            return Ok(false);
        }
        transfers.insert(entry.idempotency_key.clone(), entry.clone());
        Ok(true)
    }

    fn settle(&self, key: &str, result: &TransferResult) -> Result<(), StoreError> {
        let mut transfers = self.transfers.lock().unwrap();
        let entry = transfers
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        entry.result = Some(result.clone());
        Ok(())
    }

    fn release(&self, key: &str) -> Result<(), StoreError> {
        self.transfers
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

impl FundingRoundStore for NullStore {
    fn get_round(&self, id: &str) -> Result<Option<FundingRound>, StoreError> {
        Ok(self.rounds.lock().unwrap().get(id).cloned())
    }
}
