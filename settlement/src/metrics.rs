//! Prometheus metrics for settlement activity.
//!
//! [`SettlementMetrics`] owns a dedicated [`Registry`]; [`SettlementMetrics::encode`]
//! renders it in the text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};

use crate::SettlementError;

pub struct SettlementMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Transactions handed to the node.
    pub transfers_submitted: IntCounter,
    /// Transactions that reached the required commitment.
    pub transfers_confirmed: IntCounter,
    /// Transfers that definitely did not land.
    pub transfers_failed: IntCounter,
    /// Transfers whose outcome is unknown (timeouts, interrupted submissions).
    pub transfers_unconfirmed: IntCounter,
    /// Reconciliation reports that exceeded the epsilon.
    pub reconcile_discrepancies: IntCounter,
    /// Successful faucet airdrops.
    pub airdrops: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Submission to confirmation, in milliseconds.
    pub confirmation_latency_ms: Histogram,
}

impl SettlementMetrics {
    pub fn new() -> Result<Self, SettlementError> {
        let registry = Registry::new();

        let transfers_submitted = register_int_counter_with_registry!(
            Opts::new(
                "settlement_transfers_submitted_total",
                "Transactions submitted to the cluster"
            ),
            registry
        )?;

        let transfers_confirmed = register_int_counter_with_registry!(
            Opts::new(
                "settlement_transfers_confirmed_total",
                "Transactions confirmed at the required commitment"
            ),
            registry
        )?;

        let transfers_failed = register_int_counter_with_registry!(
            Opts::new(
                "settlement_transfers_failed_total",
                "Transfers that definitely did not land"
            ),
            registry
        )?;

        let transfers_unconfirmed = register_int_counter_with_registry!(
            Opts::new(
                "settlement_transfers_unconfirmed_total",
                "Transfers with an unknown outcome"
            ),
            registry
        )?;

        let reconcile_discrepancies = register_int_counter_with_registry!(
            Opts::new(
                "settlement_reconcile_discrepancies_total",
                "Wallets whose recorded balance drifted from the chain"
            ),
            registry
        )?;

        let airdrops = register_int_counter_with_registry!(
            Opts::new("settlement_airdrops_total", "Successful faucet airdrops"),
            registry
        )?;

        let confirmation_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "settlement_confirmation_latency_ms",
                "Time from submission to confirmation in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(50.0, 2.0, 12)?),
            registry
        )?;

        Ok(Self {
            registry,
            transfers_submitted,
            transfers_confirmed,
            transfers_failed,
            transfers_unconfirmed,
            reconcile_discrepancies,
            airdrops,
            confirmation_latency_ms,
        })
    }

    /// Text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, SettlementError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_lists_counters() {
        let metrics = SettlementMetrics::new().unwrap();
        metrics.transfers_confirmed.inc();
        metrics.confirmation_latency_ms.observe(120.0);
        let text = metrics.encode().unwrap();
        assert!(text.contains("settlement_transfers_confirmed_total 1"));
        assert!(text.contains("settlement_confirmation_latency_ms_count 1"));
    }
}
