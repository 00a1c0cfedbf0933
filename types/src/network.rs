//! Network identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies which Solana cluster the settlement core talks to.
///
/// The same value selects the RPC endpoint and the explorer cluster, so the
/// two can never disagree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    /// The production cluster.
    MainnetBeta,
    /// The public development cluster (faucet available).
    #[default]
    Devnet,
    /// The public test cluster (faucet available).
    Testnet,
    /// A local test validator.
    Localnet,
}

impl Network {
    /// Human-readable name, matching the explorer's cluster names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainnetBeta => "mainnet-beta",
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Localnet => "localnet",
        }
    }

    /// Public RPC endpoint for this cluster.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
            Self::Localnet => "http://127.0.0.1:8899",
        }
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::MainnetBeta)
    }

    /// Faucet airdrops only exist off mainnet.
    pub fn supports_airdrop(&self) -> bool {
        !self.is_mainnet()
    }

    /// Explorer link for a transaction signature on this cluster.
    pub fn explorer_tx_url(&self, signature: &str) -> String {
        let base = format!("https://explorer.solana.com/tx/{signature}");
        match self {
            Self::MainnetBeta => base,
            Self::Devnet | Self::Testnet => format!("{base}?cluster={}", self.as_str()),
            Self::Localnet => format!("{base}?cluster=custom&customUrl=http%3A%2F%2F127.0.0.1%3A8899"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" | "main" => Ok(Self::MainnetBeta),
            "devnet" | "dev" => Ok(Self::Devnet),
            "testnet" | "test" => Ok(Self::Testnet),
            "localnet" | "local" | "localhost" => Ok(Self::Localnet),
            other => Err(format!("unknown network: {other}")),
        }
    }
}
