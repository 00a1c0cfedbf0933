//! Idempotent transfers keyed by a caller-supplied token.
//!
//! A key is reserved in the transfer log before anything is signed, and the
//! outcome is attached afterwards. Replaying a settled key returns the stored
//! result without touching the network. A key that is reserved but not
//! settled (in flight, or ended ambiguously) is refused until an operator
//! reconciles and releases it.
//!
//! Single transfers go through [`IdempotentExecutor`]; batches, escrow
//! funding and payouts share [`run_once`].

use franchise_rpc::SolanaRpc;
use franchise_store::{TransferLogEntry, TransferLogStore};
use franchise_types::{Lamports, Timestamp, TransferResult, WalletAddress};
use std::future::Future;
use std::sync::Arc;

use crate::signer::{Signer, SignerAddress};
use crate::transfer::{TransferExecutor, TransferRequest};
use crate::SettlementError;

pub struct IdempotentExecutor<R, L> {
    transfers: TransferExecutor<R>,
    log: Arc<L>,
}

impl<R, L> IdempotentExecutor<R, L>
where
    R: SolanaRpc,
    L: TransferLogStore + Send + Sync,
{
    pub fn new(transfers: TransferExecutor<R>, log: Arc<L>) -> Self {
        Self { transfers, log }
    }

    /// Execute `request` at most once per idempotency key. Requests without
    /// a key run directly.
    pub async fn execute<S: Signer + ?Sized>(
        &self,
        signer: &S,
        request: &TransferRequest,
    ) -> TransferResult {
        let Some(key) = request.idempotency_key.as_deref() else {
            return self.transfers.execute(signer, request).await;
        };
        let entry = match request.validate() {
            Ok((destination, amount)) => {
                log_entry(key, signer, vec![destination], amount, &request.description)
            }
            Err(e) => return self.transfers.fail(e),
        };
        let transfers = &self.transfers;
        match run_once(self.log.as_ref(), entry, move || transfers.execute(signer, request)).await {
            Ok(result) => result,
            Err(e) => transfers.fail(e),
        }
    }

    /// Free a key whose transfer reconciliation showed did not land.
    pub fn release(&self, key: &str) -> Result<(), SettlementError> {
        self.log.release(key)?;
        tracing::info!(key, "idempotency key released");
        Ok(())
    }
}

/// A fresh log entry for an attempt that has not run yet.
pub(crate) fn log_entry<S: Signer + ?Sized>(
    key: &str,
    signer: &S,
    destinations: Vec<WalletAddress>,
    total: Lamports,
    description: &str,
) -> TransferLogEntry {
    TransferLogEntry {
        idempotency_key: key.to_string(),
        source: signer.address(),
        destinations,
        total,
        description: description.to_string(),
        result: None,
        created_at: Timestamp::now(),
    }
}

/// Run `attempt` only if `entry`'s key is new, recording its outcome.
///
/// A settled key yields the stored result; an unsettled one fails with
/// `PendingTransfer` and `attempt` never runs.
pub(crate) async fn run_once<L, F, Fut>(
    log: &L,
    entry: TransferLogEntry,
    attempt: F,
) -> Result<TransferResult, SettlementError>
where
    L: TransferLogStore + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = TransferResult>,
{
    let key = entry.idempotency_key.as_str();
    if let Some(existing) = log.get_entry(key)? {
        let settled = existing.is_settled();
        return match existing.result {
            Some(result) if settled => {
                tracing::info!(key, "returning recorded transfer result");
                Ok(result)
            }
            _ => Err(SettlementError::PendingTransfer(key.to_string())),
        };
    }
    if !log.reserve(&entry)? {
        // Lost a race with a concurrent caller.
        return Err(SettlementError::PendingTransfer(key.to_string()));
    }

    let result = attempt().await;
    if let Err(e) = log.settle(key, &result) {
        tracing::error!(key, error = %e, "failed to record transfer outcome");
    }
    Ok(result)
}
