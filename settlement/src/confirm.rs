//! Confirmation polling.
//!
//! Outcomes:
//! - status carries an error: definite failure
//! - commitment reached: confirmed
//! - unseen after the blockhash's last valid block height: definite failure
//! - timeout: ambiguous, the transaction may still land

use franchise_rpc::SolanaRpc;
use franchise_types::Commitment;
use solana_sdk::signature::Signature;
use std::time::{Duration, Instant};

use crate::SettlementError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub commitment: Commitment,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            commitment: Commitment::Confirmed,
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ConfirmationPolicy {
    /// Poll until `signature` reaches the required commitment.
    ///
    /// `last_valid_block_height` bounds the blockhash the transaction was
    /// built on; pass `None` when there is none (faucet airdrops).
    pub async fn await_confirmation<R: SolanaRpc>(
        &self,
        rpc: &R,
        signature: &Signature,
        last_valid_block_height: Option<u64>,
    ) -> Result<Duration, SettlementError> {
        let started = Instant::now();
        loop {
            match rpc.get_signature_status(signature).await {
                Ok(Some(status)) => {
                    if let Some(err) = status.error_message() {
                        return Err(SettlementError::OnChain(err.to_string()));
                    }
                    if self.commitment.is_satisfied_by(status.reached()) {
                        return Ok(started.elapsed());
                    }
                }
                Ok(None) => {
                    if let Some(last_valid) = last_valid_block_height {
                        if self.blockhash_expired(rpc, signature, last_valid).await {
                            return Err(SettlementError::BlockhashExpired(*signature));
                        }
                    }
                }
                // Transient; the deadline below still bounds the wait.
                Err(e) => tracing::warn!(signature = %signature, error = %e, "status poll failed"),
            }

            if started.elapsed() >= self.timeout {
                return Err(SettlementError::Unconfirmed {
                    signature: *signature,
                    waited_secs: self.timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// The chain is past `last_valid` and a final status read still shows
    /// nothing, so the transaction can never land.
    async fn blockhash_expired<R: SolanaRpc>(
        &self,
        rpc: &R,
        signature: &Signature,
        last_valid: u64,
    ) -> bool {
        match rpc.get_block_height(self.commitment).await {
            Ok(height) if height > last_valid => {}
            Ok(_) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "block height poll failed");
                return false;
            }
        }
        matches!(rpc.get_signature_status(signature).await, Ok(None))
    }
}
