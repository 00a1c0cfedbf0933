//! Wallet records.

use franchise_types::{Lamports, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// What a wallet is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletRole {
    /// Investor-owned; custody may be delegated to the platform.
    User,
    /// Pools contributions for one funding round.
    Escrow,
    /// Operator-controlled; seeds and funds other wallets.
    Platform,
    /// A franchise's working-capital wallet, the payout destination.
    Franchise,
}

/// An envelope-encrypted secret key, as persisted. Encryption and decryption
/// live in `franchise_settlement::keystore`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreFile {
    pub version: u32,
    pub crypto: KeystoreCrypto,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreCrypto {
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    /// Hex-encoded salt.
    pub salt: String,
    /// Hex-encoded nonce.
    pub nonce: String,
    /// Hex-encoded ciphertext.
    pub ciphertext: String,
}

/// KDF parameters for Argon2id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// The off-chain view of a wallet.
///
/// `recorded_balance` is a cache of the on-chain balance. It can drift and is
/// never used to authorize a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub address: WalletAddress,
    pub role: WalletRole,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub recorded_balance: Lamports,
    /// Custodial secret, only ever stored encrypted.
    #[serde(default)]
    pub keystore: Option<KeystoreFile>,
    pub updated_at: Timestamp,
}

impl WalletRecord {
    pub fn new(address: WalletAddress, role: WalletRole) -> Self {
        Self {
            address,
            role,
            label: None,
            recorded_balance: Lamports::ZERO,
            keystore: None,
            updated_at: Timestamp::now(),
        }
    }
}

/// Trait for wallet record storage.
pub trait WalletStore {
    fn get_wallet(&self, address: &WalletAddress) -> Result<Option<WalletRecord>, StoreError>;
    fn put_wallet(&self, record: &WalletRecord) -> Result<(), StoreError>;
    /// Overwrite the cached balance. Fails with `NotFound` for unknown wallets.
    fn update_recorded_balance(
        &self,
        address: &WalletAddress,
        balance: Lamports,
    ) -> Result<(), StoreError>;
    fn wallets_by_role(&self, role: WalletRole) -> Result<Vec<WalletRecord>, StoreError>;
}
