//! Balance reconciliation: on-chain truth versus the recorded cache.
//!
//! Reports never correct anything. [`Reconciler::sync`] is the explicit
//! write that copies the on-chain figure into the store.

use franchise_rpc::SolanaRpc;
use franchise_store::{WalletRole, WalletStore};
use franchise_types::{Commitment, Lamports, ReconcileReport, WalletAddress};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

use crate::metrics::SettlementMetrics;
use crate::SettlementError;

pub struct Reconciler<R, W> {
    rpc: Arc<R>,
    store: Arc<W>,
    commitment: Commitment,
    epsilon: Lamports,
    concurrency: usize,
    metrics: Option<Arc<SettlementMetrics>>,
}

impl<R, W> Reconciler<R, W>
where
    R: SolanaRpc,
    W: WalletStore + Send + Sync,
{
    pub fn new(rpc: Arc<R>, store: Arc<W>, commitment: Commitment) -> Self {
        Self {
            rpc,
            store,
            commitment,
            epsilon: Lamports::new(1),
            concurrency: 8,
            metrics: None,
        }
    }

    /// Largest discrepancy not reported as drift.
    pub fn with_epsilon(mut self, epsilon: Lamports) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<SettlementMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Compare one wallet. An unrecorded wallet is compared against zero.
    pub async fn reconcile(&self, address: &WalletAddress) -> Result<ReconcileReport, SettlementError> {
        let on_chain = self.rpc.get_balance(address, self.commitment).await?;
        let recorded = self
            .store
            .get_wallet(address)?
            .map(|record| record.recorded_balance);

        let discrepancy = on_chain.signed_diff(recorded.unwrap_or(Lamports::ZERO));
        let drifted = discrepancy.unsigned_abs() > self.epsilon.raw() as u128;
        if drifted {
            if let Some(m) = &self.metrics {
                m.reconcile_discrepancies.inc();
            }
            tracing::warn!(
                address = %address,
                on_chain = %on_chain,
                recorded = ?recorded.map(|r| r.to_string()),
                discrepancy = %discrepancy,
                "balance drift"
            );
        } else {
            tracing::debug!(address = %address, on_chain = %on_chain, "balance in sync");
        }

        Ok(ReconcileReport {
            address: address.clone(),
            on_chain_balance: on_chain,
            recorded_balance: recorded,
            discrepancy,
            drifted,
        })
    }

    /// Reconcile many wallets with at most `concurrency` reads in flight.
    /// Results come back in input order.
    pub async fn reconcile_many(
        &self,
        addresses: &[WalletAddress],
    ) -> Vec<(WalletAddress, Result<ReconcileReport, SettlementError>)> {
        stream::iter(addresses)
            .map(|address| async move { (address.clone(), self.reconcile(address).await) })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Reconcile every stored wallet with `role`.
    pub async fn reconcile_role(
        &self,
        role: WalletRole,
    ) -> Result<Vec<(WalletAddress, Result<ReconcileReport, SettlementError>)>, SettlementError> {
        let addresses: Vec<WalletAddress> = self
            .store
            .wallets_by_role(role)?
            .into_iter()
            .map(|record| record.address)
            .collect();
        tracing::info!(role = ?role, wallets = addresses.len(), "reconciling role");
        Ok(self.reconcile_many(&addresses).await)
    }

    /// Store the report's on-chain balance as the recorded balance.
    pub fn sync(&self, report: &ReconcileReport) -> Result<(), SettlementError> {
        self.store
            .update_recorded_balance(&report.address, report.on_chain_balance)?;
        tracing::info!(
            address = %report.address,
            balance = %report.on_chain_balance,
            "recorded balance synced"
        );
        Ok(())
    }
}
