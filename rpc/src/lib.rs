//! Cluster access for the settlement core.
//!
//! The settlement core talks to the network only through the [`SolanaRpc`]
//! trait:
//! - Latest blockhash (with its last valid block height)
//! - Transaction submission with preflight simulation
//! - Signature status polling
//! - Balance and block height reads
//! - Faucet airdrops (test clusters only)
//!
//! [`RpcClient`] implements it over `solana_client`'s nonblocking client;
//! tests swap in `franchise_nullables::NullRpc`.

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::SolanaRpc;
pub use client::RpcClient;
pub use error::RpcError;
pub use types::{commitment_config, LatestBlockhash, SendConfig, SignatureStatus};
