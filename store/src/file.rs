//! JSON file store for operator scripts.
//!
//! The whole dataset lives in one pretty-printed JSON document. Every write
//! rewrites the document through a temporary file and a rename, so a crash
//! leaves either the old or the new contents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use franchise_types::{Lamports, Timestamp, TransferResult, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::{
    FundingRound, FundingRoundStore, StoreError, TransferLogEntry, TransferLogStore, WalletRecord,
    WalletRole, WalletStore,
};

#[derive(Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    wallets: BTreeMap<String, WalletRecord>,
    #[serde(default)]
    transfers: BTreeMap<String, TransferLogEntry>,
    #[serde(default)]
    rounds: BTreeMap<String, FundingRound>,
}

/// A file-backed implementation of every store trait.
pub struct JsonFileStore {
    path: PathBuf,
    doc: Mutex<Document>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| StoreError::Backend(format!("read {}: {e}", path.display())))?;
            serde_json::from_str(&text)
                .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?
        } else {
            Document::default()
        };
        tracing::debug!(
            path = %path.display(),
            wallets = doc.wallets.len(),
            transfers = doc.transfers.len(),
            rounds = doc.rounds.len(),
            "opened file store"
        );
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace a funding round. Rounds are owned by the platform;
    /// this exists for seeding a local file.
    pub fn insert_round(&self, round: &FundingRound) -> Result<(), StoreError> {
        self.write(|doc| {
            doc.rounds.insert(round.id.clone(), round.clone());
            Ok(())
        })
    }

    fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> Result<R, StoreError> {
        let doc = self
            .doc
            .lock()
            .map_err(|_| StoreError::Poisoned)?;
        Ok(f(&doc))
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut doc = self
            .doc
            .lock()
            .map_err(|_| StoreError::Poisoned)?;
        let out = f(&mut doc)?;
        self.persist(&doc)?;
        Ok(out)
    }

    fn persist(&self, doc: &Document) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| StoreError::Backend(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Backend(format!("rename to {}: {e}", self.path.display())))
    }
}

impl WalletStore for JsonFileStore {
    fn get_wallet(&self, address: &WalletAddress) -> Result<Option<WalletRecord>, StoreError> {
        self.read(|doc| doc.wallets.get(address.as_str()).cloned())
    }

    fn put_wallet(&self, record: &WalletRecord) -> Result<(), StoreError> {
        self.write(|doc| {
            doc.wallets
                .insert(record.address.to_string(), record.clone());
            Ok(())
        })
    }

    fn update_recorded_balance(
        &self,
        address: &WalletAddress,
        balance: Lamports,
    ) -> Result<(), StoreError> {
        self.write(|doc| {
            let record = doc
                .wallets
                .get_mut(address.as_str())
                .ok_or_else(|| StoreError::NotFound(address.to_string()))?;
            record.recorded_balance = balance;
            record.updated_at = Timestamp::now();
            Ok(())
        })
    }

    fn wallets_by_role(&self, role: WalletRole) -> Result<Vec<WalletRecord>, StoreError> {
        self.read(|doc| {
            doc.wallets
                .values()
                .filter(|w| w.role == role)
                .cloned()
                .collect()
        })
    }
}

impl TransferLogStore for JsonFileStore {
    fn get_entry(&self, key: &str) -> Result<Option<TransferLogEntry>, StoreError> {
        self.read(|doc| doc.transfers.get(key).cloned())
    }

    fn reserve(&self, entry: &TransferLogEntry) -> Result<bool, StoreError> {
        self.write(|doc| {
            if doc.transfers.contains_key(&entry.idempotency_key) {
                return Ok(false);
            }
            doc.transfers
                .insert(entry.idempotency_key.clone(), entry.clone());
            Ok(true)
        })
    }

    fn settle(&self, key: &str, result: &TransferResult) -> Result<(), StoreError> {
        self.write(|doc| {
            let entry = doc
                .transfers
                .get_mut(key)
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            entry.result = Some(result.clone());
            Ok(())
        })
    }

    fn release(&self, key: &str) -> Result<(), StoreError> {
        self.write(|doc| {
            doc.transfers
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(key.to_string()))
        })
    }
}

impl FundingRoundStore for JsonFileStore {
    fn get_round(&self, id: &str) -> Result<Option<FundingRound>, StoreError> {
        self.read(|doc| doc.rounds.get(id).cloned())
    }
}
