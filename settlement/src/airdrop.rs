//! Faucet funding for test clusters.

use franchise_rpc::SolanaRpc;
use franchise_types::{AirdropResult, Lamports, Network, TransferStatus, WalletAddress};
use std::sync::Arc;

use crate::confirm::ConfirmationPolicy;
use crate::metrics::SettlementMetrics;
use crate::SettlementError;

/// Requests faucet airdrops. Refuses mainnet. Does not throttle itself;
/// callers looping over wallets pace their own requests.
pub struct AirdropUtility<R> {
    rpc: Arc<R>,
    network: Network,
    policy: ConfirmationPolicy,
    metrics: Option<Arc<SettlementMetrics>>,
}

impl<R: SolanaRpc> AirdropUtility<R> {
    pub fn new(rpc: Arc<R>, network: Network, policy: ConfirmationPolicy) -> Self {
        Self {
            rpc,
            network,
            policy,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<SettlementMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn request_test_funds(&self, wallet: &WalletAddress, amount: Lamports) -> AirdropResult {
        match self.try_airdrop(wallet, amount).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(wallet = %wallet, error = %e, "airdrop failed");
                AirdropResult::failed(e.to_string())
            }
        }
    }

    async fn try_airdrop(
        &self,
        wallet: &WalletAddress,
        amount: Lamports,
    ) -> Result<AirdropResult, SettlementError> {
        if !self.network.supports_airdrop() {
            return Err(SettlementError::AirdropUnsupported(self.network));
        }
        if amount.is_zero() {
            return Err(SettlementError::NonPositiveAmount);
        }
        tracing::info!(wallet = %wallet, amount = %amount, network = %self.network, "requesting airdrop");

        let signature = self.rpc.request_airdrop(wallet, amount).await?;
        match self
            .policy
            .await_confirmation(self.rpc.as_ref(), &signature, None)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_ambiguous() => {
                tracing::warn!(wallet = %wallet, signature = %signature, error = %e, "airdrop outcome unknown");
                return Ok(AirdropResult::unknown(signature, amount, self.network, e.to_string()));
            }
            Err(e) => return Err(e),
        }
        let new_balance = self.rpc.get_balance(wallet, self.policy.commitment).await?;

        if let Some(m) = &self.metrics {
            m.airdrops.inc();
        }
        tracing::info!(
            wallet = %wallet,
            signature = %signature,
            new_balance = %new_balance,
            "airdrop confirmed"
        );
        Ok(AirdropResult {
            success: true,
            status: TransferStatus::Confirmed,
            amount_airdropped: Some(amount),
            new_balance: Some(new_balance),
            explorer_url: Some(self.network.explorer_tx_url(&signature.to_string())),
            signature: Some(signature),
            error: None,
        })
    }
}
