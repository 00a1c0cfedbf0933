//! Many transfers in one atomic transaction.

use franchise_rpc::SolanaRpc;
use franchise_store::TransferLogStore;
use franchise_transactions::transfer_instructions;
use franchise_types::{BatchTransferResult, Lamports, TransferResult, TypesError, WalletAddress};
use solana_sdk::signature::Signature;
use std::sync::Arc;

use crate::idempotency::{log_entry, run_once};
use crate::signer::Signer;
use crate::transfer::{TransferExecutor, TransferRequest};
use crate::SettlementError;

/// One leg of a batch: the same shape as a single request.
pub type TransferLeg = TransferRequest;

/// Packs every leg into one transaction: one signature, one fee, all or
/// nothing. Legs are validated up front, so a single malformed leg fails the
/// batch before anything is submitted.
pub struct BatchTransferExecutor<R> {
    transfers: TransferExecutor<R>,
    log: Option<Arc<dyn TransferLogStore + Send + Sync>>,
}

/// Validated legs and their sum.
struct BatchPlan {
    legs: Vec<(WalletAddress, Lamports)>,
    total: Lamports,
}

impl<R: SolanaRpc> BatchTransferExecutor<R> {
    pub fn new(transfers: TransferExecutor<R>) -> Self {
        Self {
            transfers,
            log: None,
        }
    }

    /// Record keyed batches in `log` so a key submits at most once.
    pub fn with_transfer_log(mut self, log: Arc<dyn TransferLogStore + Send + Sync>) -> Self {
        self.log = Some(log);
        self
    }

    /// Submit every leg. With an `idempotency_key`, a repeat call replays the
    /// recorded outcome instead of paying twice.
    pub async fn execute_batch<S: Signer + ?Sized>(
        &self,
        signer: &S,
        legs: &[TransferLeg],
        idempotency_key: Option<&str>,
    ) -> BatchTransferResult {
        let result = match self.run(signer, legs, idempotency_key).await {
            Ok(result) => result,
            Err(e) => self.transfers.fail(e),
        };
        BatchTransferResult {
            result,
            transfer_count: legs.len(),
        }
    }

    async fn run<S: Signer + ?Sized>(
        &self,
        signer: &S,
        legs: &[TransferLeg],
        idempotency_key: Option<&str>,
    ) -> Result<TransferResult, SettlementError> {
        let plan = plan(legs)?;
        let Some(key) = idempotency_key else {
            return Ok(self.submit(signer, &plan).await);
        };
        let log = self
            .log
            .as_deref()
            .ok_or_else(|| SettlementError::NoTransferLog(key.to_string()))?;
        let destinations = plan.legs.iter().map(|(to, _)| to.clone()).collect();
        let entry = log_entry(key, signer, destinations, plan.total, "batch transfer");
        let plan = &plan;
        run_once(log, entry, move || self.submit(signer, plan)).await
    }

    async fn submit<S: Signer + ?Sized>(&self, signer: &S, plan: &BatchPlan) -> TransferResult {
        match self.try_submit(signer, plan).await {
            Ok(signature) => TransferResult::confirmed(signature, self.transfers.network()),
            Err(e) => self.transfers.fail(e),
        }
    }

    async fn try_submit<S: Signer + ?Sized>(
        &self,
        signer: &S,
        plan: &BatchPlan,
    ) -> Result<Signature, SettlementError> {
        let source = signer.try_pubkey()?;
        tracing::info!(
            source = %source,
            legs = plan.legs.len(),
            lamports = plan.total.raw(),
            "submitting batch transfer"
        );
        let legs: Vec<_> = plan.legs.iter().map(|(to, amount)| (to.pubkey(), *amount)).collect();
        let instructions = transfer_instructions(&source, &legs);
        self.transfers.send_instructions(signer, &instructions).await
    }
}

fn plan(legs: &[TransferLeg]) -> Result<BatchPlan, SettlementError> {
    if legs.is_empty() {
        return Err(SettlementError::EmptyBatch);
    }
    let mut parsed = Vec::with_capacity(legs.len());
    let mut total = Lamports::ZERO;
    for (index, leg) in legs.iter().enumerate() {
        let (destination, amount) = leg.validate().map_err(|e| match e {
            SettlementError::InvalidAddress(reason) => {
                SettlementError::InvalidAddress(format!("leg {index}: {reason}"))
            }
            other => other,
        })?;
        total = total
            .checked_add(amount)
            .ok_or(TypesError::AmountOverflow)?;
        parsed.push((destination, amount));
    }
    Ok(BatchPlan {
        legs: parsed,
        total,
    })
}
