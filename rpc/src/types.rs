//! Request options and response shapes.

use franchise_types::Commitment;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;

/// A blockhash plus the last block height at which it is still valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Options for `sendTransaction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendConfig {
    pub skip_preflight: bool,
    pub preflight_commitment: Commitment,
    /// Node-side rebroadcast attempts; `None` uses the node default.
    pub max_retries: Option<usize>,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            skip_preflight: false,
            preflight_commitment: Commitment::Confirmed,
            max_retries: None,
        }
    }
}

/// One entry of `getSignatureStatuses`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureStatus {
    pub slot: u64,
    /// `None` once the block is rooted.
    pub confirmations: Option<u64>,
    /// Execution error, if the transaction landed but failed.
    pub err: Option<String>,
    pub confirmation_status: Option<Commitment>,
}

impl SignatureStatus {
    /// The commitment level this status has reached.
    pub fn reached(&self) -> Commitment {
        match (self.confirmation_status, self.confirmations) {
            (Some(level), _) => level,
            (None, None) => Commitment::Finalized,
            (None, Some(_)) => Commitment::Confirmed,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.err.as_deref()
    }
}

pub fn commitment_config(commitment: Commitment) -> CommitmentConfig {
    match commitment {
        Commitment::Processed => CommitmentConfig::processed(),
        Commitment::Confirmed => CommitmentConfig::confirmed(),
        Commitment::Finalized => CommitmentConfig::finalized(),
    }
}
