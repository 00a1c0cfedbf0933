//! Settlement core for the franchise marketplace.
//!
//! Moves native SOL between user, escrow, platform and franchise wallets:
//! - [`TransferExecutor`]: one transfer, blockhash to confirmation
//! - [`BatchTransferExecutor`]: many legs in one atomic transaction
//! - [`EscrowFunder`]: balance-checked funding of franchise wallets, and
//!   payouts approved through the [`PayoutGate`]
//! - [`Reconciler`]: on-chain versus recorded balances
//! - [`AirdropUtility`]: faucet funding on test clusters
//!
//! Every executor returns a result record rather than an error. Network
//! access goes through `franchise_rpc::SolanaRpc` and keys through
//! `solana_sdk`'s [`Signer`], so tests run against `franchise_nullables`.

pub mod airdrop;
pub mod batch;
pub mod config;
pub mod confirm;
pub mod error;
pub mod escrow;
pub mod idempotency;
pub mod keystore;
pub mod metrics;
pub mod payout;
pub mod reconcile;
pub mod signer;
pub mod transfer;

pub use airdrop::AirdropUtility;
pub use batch::{BatchTransferExecutor, TransferLeg};
pub use config::SettlementConfig;
pub use confirm::ConfirmationPolicy;
pub use error::SettlementError;
pub use escrow::EscrowFunder;
pub use idempotency::IdempotentExecutor;
pub use keystore::{
    decrypt_keystore, encrypt_keystore, encrypt_keystore_with, load_keystore, save_keystore,
};
pub use metrics::SettlementMetrics;
pub use payout::{PayoutAuthorization, PayoutGate};
pub use reconcile::Reconciler;
pub use signer::{KeystoreSigner, Signer, SignerAddress};
pub use transfer::{lamports_from_sol, TransferExecutor, TransferRequest};
