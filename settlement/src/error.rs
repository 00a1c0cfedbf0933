use franchise_crypto::CryptoError;
use franchise_rpc::RpcError;
use franchise_store::StoreError;
use franchise_transactions::TransactionError;
use franchise_types::{Lamports, Network, TransferResult, TypesError};
use solana_sdk::signature::Signature;
use solana_sdk::signer::SignerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("{0}")]
    SecretKey(#[from] CryptoError),

    #[error("Public key does not match secret key")]
    PublicKeyMismatch,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] TypesError),

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("batch has no transfers")]
    EmptyBatch,

    #[error("batch too large: {size} bytes exceeds the {max}-byte packet limit")]
    BatchTooLarge { size: usize, max: usize },

    #[error(
        "Insufficient platform wallet balance. Have: {}, Need: {}",
        .have.to_sol_string(4),
        .need
    )]
    InsufficientBalance { have: Lamports, need: Lamports },

    #[error("failed to build transaction: {0}")]
    Transaction(TransactionError),

    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// The request may have reached the node; its fate is unknown.
    #[error("submission of {signature} did not complete ({reason}); reconcile before retrying")]
    SubmitUncertain { signature: Signature, reason: String },

    #[error("transaction failed on-chain: {0}")]
    OnChain(String),

    #[error("blockhash expired before {0} was confirmed")]
    BlockhashExpired(Signature),

    #[error("could not confirm {signature} within {waited_secs}s; reconcile before retrying")]
    Unconfirmed { signature: Signature, waited_secs: u64 },

    #[error("transfer {0} is already in flight or unresolved; reconcile before retrying")]
    PendingTransfer(String),

    #[error("airdrop not supported on {0}")]
    AirdropUnsupported(Network),

    #[error("payout not authorized: {0}")]
    Unauthorized(String),

    #[error("idempotency key {0} given but no transfer log is configured")]
    NoTransferLog(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("keystore error: {0}")]
    Keystore(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl From<TransactionError> for SettlementError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::TooLarge { size, max } => Self::BatchTooLarge { size, max },
            other => Self::Transaction(other),
        }
    }
}

impl SettlementError {
    /// The transfer may or may not have landed. Callers must reconcile
    /// before retrying.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Self::SubmitUncertain { .. } | Self::Unconfirmed { .. } | Self::PendingTransfer(_)
        )
    }

    /// Signature of a transaction that was signed and handed to the node.
    pub fn signature(&self) -> Option<Signature> {
        match self {
            Self::SubmitUncertain { signature, .. } | Self::Unconfirmed { signature, .. } => {
                Some(*signature)
            }
            Self::BlockhashExpired(signature) => Some(*signature),
            _ => None,
        }
    }

    /// Convert into the outbound result record.
    pub fn into_result(self, network: Network) -> TransferResult {
        if self.is_ambiguous() {
            TransferResult::unknown(self.signature(), network, self.to_string())
        } else {
            TransferResult::failed(self.to_string())
        }
    }
}
