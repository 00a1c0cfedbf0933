//! Nullable infrastructure for deterministic testing.
//!
//! The settlement core reaches the outside world through two seams: the
//! `SolanaRpc` trait and the store traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (failure injection, balances)
//! - Never touch the filesystem or network
//!
//! Usage: swap `RpcClient`/`JsonFileStore` for nullables in tests.

pub mod rpc;
pub mod store;

pub use rpc::{NullRpc, SubmitMode, FEE_PER_SIGNATURE};
pub use store::NullStore;
