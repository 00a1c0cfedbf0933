//! Abstract storage traits for the settlement core.
//!
//! The off-chain data store is an external collaborator. Every backend (the
//! hosted platform store, the JSON file store for operator scripts, the
//! in-memory store for tests) implements these traits; the settlement code
//! depends only on the traits.

pub mod error;
pub mod file;
pub mod funding_round;
pub mod transfer_log;
pub mod wallet;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use funding_round::{FundingRound, FundingRoundStore};
pub use transfer_log::{TransferLogEntry, TransferLogStore};
pub use wallet::{KdfParams, KeystoreCrypto, KeystoreFile, WalletRecord, WalletRole, WalletStore};
