//! Escrow funding: privileged transfers into franchise working-capital wallets.

use franchise_rpc::SolanaRpc;
use franchise_store::{FundingRoundStore, TransferLogStore};
use franchise_transactions::transfer_instructions;
use franchise_types::{FundingResult, Lamports, TransferResult, WalletAddress};
use solana_sdk::signature::Signature;
use std::sync::Arc;

use crate::idempotency::{log_entry, run_once};
use crate::payout::PayoutAuthorization;
use crate::signer::{Signer, SignerAddress};
use crate::transfer::TransferExecutor;
use crate::SettlementError;

/// Moves funds from the platform or an escrow wallet into a franchise wallet.
///
/// The live balance is checked first; a shortfall fails with both figures and
/// nothing is submitted.
pub struct EscrowFunder<R> {
    transfers: TransferExecutor<R>,
    log: Option<Arc<dyn TransferLogStore + Send + Sync>>,
}

impl<R: SolanaRpc> EscrowFunder<R> {
    pub fn new(transfers: TransferExecutor<R>) -> Self {
        Self {
            transfers,
            log: None,
        }
    }

    /// Record keyed fundings in `log` so a key submits at most once.
    pub fn with_transfer_log(mut self, log: Arc<dyn TransferLogStore + Send + Sync>) -> Self {
        self.log = Some(log);
        self
    }

    pub async fn fund_franchise_wallet<S: Signer + ?Sized>(
        &self,
        signer: &S,
        source: &WalletAddress,
        franchise_wallet: &WalletAddress,
        amount: Lamports,
        description: &str,
        idempotency_key: Option<&str>,
    ) -> FundingResult {
        let attempt = move || self.fund(signer, source, franchise_wallet, amount, description);
        let result = match idempotency_key {
            None => attempt().await,
            Some(key) => match self.log.as_deref() {
                Some(log) => {
                    let entry =
                        log_entry(key, signer, vec![franchise_wallet.clone()], amount, description);
                    run_once(log, entry, attempt)
                        .await
                        .unwrap_or_else(|e| self.transfers.fail(e))
                }
                None => self
                    .transfers
                    .fail(SettlementError::NoTransferLog(key.to_string())),
            },
        };
        self.funding_result(result, franchise_wallet, amount)
    }

    /// Execute a payout the gate approved. The round is re-read so a stale
    /// or altered authorization is refused, and the payout is recorded under
    /// the round's key: presenting the same authorization again replays the
    /// first outcome rather than paying twice.
    pub async fn pay_out<S, F>(
        &self,
        store: &F,
        authorization: &PayoutAuthorization,
        signer: &S,
        description: &str,
    ) -> FundingResult
    where
        S: Signer + ?Sized,
        F: FundingRoundStore + TransferLogStore + Sync,
    {
        let franchise_wallet = &authorization.franchise_wallet;
        let amount = authorization.amount;
        if let Err(e) = authorization.verify(store, &signer.address()) {
            return self.funding_result(self.transfers.fail(e), franchise_wallet, amount);
        }
        tracing::info!(
            round = %authorization.round_id,
            approved_by = %authorization.approved_by,
            "executing authorized payout"
        );
        let key = authorization.idempotency_key();
        let entry = log_entry(&key, signer, vec![franchise_wallet.clone()], amount, description);
        let escrow = &authorization.escrow_wallet;
        let result = run_once(store, entry, move || {
            self.fund(signer, escrow, franchise_wallet, amount, description)
        })
        .await
        .unwrap_or_else(|e| self.transfers.fail(e));
        self.funding_result(result, franchise_wallet, amount)
    }

    fn funding_result(
        &self,
        result: TransferResult,
        franchise_wallet: &WalletAddress,
        amount: Lamports,
    ) -> FundingResult {
        FundingResult {
            result,
            franchise_wallet: franchise_wallet.clone(),
            amount,
            network: self.transfers.network(),
        }
    }

    async fn fund<S: Signer + ?Sized>(
        &self,
        signer: &S,
        source: &WalletAddress,
        franchise_wallet: &WalletAddress,
        amount: Lamports,
        description: &str,
    ) -> TransferResult {
        match self
            .try_fund(signer, source, franchise_wallet, amount, description)
            .await
        {
            Ok(signature) => TransferResult::confirmed(signature, self.transfers.network()),
            Err(e) => self.transfers.fail(e),
        }
    }

    async fn try_fund<S: Signer + ?Sized>(
        &self,
        signer: &S,
        source: &WalletAddress,
        franchise_wallet: &WalletAddress,
        amount: Lamports,
        description: &str,
    ) -> Result<Signature, SettlementError> {
        if signer.address() != *source {
            return Err(SettlementError::PublicKeyMismatch);
        }
        if amount.is_zero() {
            return Err(SettlementError::NonPositiveAmount);
        }
        tracing::info!(
            source = %source,
            destination = %franchise_wallet,
            amount = %amount,
            "funding franchise wallet"
        );

        let commitment = self.transfers.policy().commitment;
        let balance = self.transfers.rpc().get_balance(source, commitment).await?;
        if balance < amount {
            tracing::warn!(
                have = %balance.to_sol_string(4),
                need = %amount,
                "balance check failed"
            );
            return Err(SettlementError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }
        tracing::info!(have = %balance.to_sol_string(4), need = %amount, "balance check passed");

        let instructions =
            transfer_instructions(&signer.try_pubkey()?, &[(franchise_wallet.pubkey(), amount)]);
        let signature = self.transfers.send_instructions(signer, &instructions).await?;
        tracing::info!(
            signature = %signature,
            destination = %franchise_wallet,
            description,
            "franchise wallet funded"
        );
        Ok(signature)
    }
}
