//! Settlement configuration with TOML file support.

use franchise_types::{Commitment, Lamports, Network};
use franchise_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::confirm::ConfirmationPolicy;
use crate::SettlementError;

/// Configuration injected into every executor at construction.
///
/// Can be loaded from a TOML file via [`SettlementConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Nothing is read from the
/// environment at call time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Cluster to settle on. Decides the default endpoint and explorer links.
    #[serde(default)]
    pub network: Network,

    /// Endpoint override; `None` uses the cluster's public endpoint.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Commitment required for confirmation, preflight and balance reads.
    #[serde(default)]
    pub commitment: Commitment,

    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Largest discrepancy, in lamports, not reported as drift.
    #[serde(default = "default_reconcile_epsilon")]
    pub reconcile_epsilon_lamports: u64,

    /// Balance reads in flight at once during a reconciliation sweep.
    #[serde(default = "default_reconcile_concurrency")]
    pub reconcile_concurrency: usize,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// JSON file backing the wallet, transfer-log and funding-round store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, e.g. `"info"` or `"debug,franchise_rpc=trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_confirm_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_reconcile_epsilon() -> u64 {
    1
}

fn default_reconcile_concurrency() -> usize {
    8
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./settlement-store.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SettlementConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SettlementError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettlementError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, SettlementError> {
        toml::from_str(s).map_err(|e| SettlementError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, SettlementError> {
        toml::to_string_pretty(self).map_err(|e| SettlementError::Config(e.to_string()))
    }

    /// The endpoint to talk to.
    pub fn rpc_endpoint(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            commitment: self.commitment,
            timeout: Duration::from_secs(self.confirm_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn reconcile_epsilon(&self) -> Lamports {
        Lamports::new(self.reconcile_epsilon_lamports)
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<(), SettlementError> {
        if self.poll_interval_ms == 0 {
            return Err(SettlementError::Config("poll_interval_ms must be positive".into()));
        }
        if self.reconcile_concurrency == 0 {
            return Err(SettlementError::Config(
                "reconcile_concurrency must be positive".into(),
            ));
        }
        if self.network.is_mainnet() && self.commitment == Commitment::Processed {
            return Err(SettlementError::Config(
                "processed commitment is not allowed on mainnet-beta".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            rpc_url: None,
            commitment: Commitment::default(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            reconcile_epsilon_lamports: default_reconcile_epsilon(),
            reconcile_concurrency: default_reconcile_concurrency(),
            http_timeout_secs: default_http_timeout_secs(),
            store_path: default_store_path(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
