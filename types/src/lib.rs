//! Fundamental types for the franchise settlement core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! lamport amounts, wallet addresses, network and commitment selectors, and the
//! result records handed back to callers. Keys, signatures and blockhashes are
//! `solana_sdk`'s own types.

pub mod address;
pub mod amount;
pub mod commitment;
pub mod error;
pub mod network;
pub mod record;
pub mod time;

pub use address::WalletAddress;
pub use amount::{Lamports, LAMPORTS_PER_SOL};
pub use commitment::Commitment;
pub use error::TypesError;
pub use network::Network;
pub use record::{
    AirdropResult, BatchTransferResult, FundingResult, ReconcileReport, TransferResult,
    TransferStatus,
};
pub use time::Timestamp;
