//! The network seam.

use std::future::Future;

use franchise_types::{Commitment, Lamports, WalletAddress};
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::{LatestBlockhash, RpcError, SendConfig, SignatureStatus};

/// Operations the settlement core needs from a cluster node.
pub trait SolanaRpc: Send + Sync {
    fn get_latest_blockhash(
        &self,
        commitment: Commitment,
    ) -> impl Future<Output = Result<LatestBlockhash, RpcError>> + Send;

    /// Submit a fully signed transaction. Returns its signature (the
    /// transaction id).
    fn send_transaction(
        &self,
        transaction: &Transaction,
        config: SendConfig,
    ) -> impl Future<Output = Result<Signature, RpcError>> + Send;

    /// `Ok(None)` means the node has not seen the signature (yet).
    fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<Option<SignatureStatus>, RpcError>> + Send;

    fn get_balance(
        &self,
        address: &WalletAddress,
        commitment: Commitment,
    ) -> impl Future<Output = Result<Lamports, RpcError>> + Send;

    fn get_block_height(
        &self,
        commitment: Commitment,
    ) -> impl Future<Output = Result<u64, RpcError>> + Send;

    fn request_airdrop(
        &self,
        address: &WalletAddress,
        amount: Lamports,
    ) -> impl Future<Output = Result<Signature, RpcError>> + Send;
}
