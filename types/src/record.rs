//! Result records returned by every settlement operation.
//!
//! These are the durable artifacts a caller writes back to the data store.
//! Field names serialize in camelCase to match the store's record shape:
//! `{ success, signature, explorerUrl, error, ... }`.

use serde::{Deserialize, Serialize};
use solana_sdk::signature::Signature;

use crate::{amount, Lamports, Network, WalletAddress};

/// Outcome class of a submitted (or rejected) transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Reached the required commitment level.
    Confirmed,
    /// Definitely did not land (rejected before or after submission).
    Failed,
    /// Submitted but not observed in time; may still land. Reconcile first.
    Unknown,
}

/// Result of a single transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub success: bool,
    pub status: TransferStatus,
    #[serde(with = "signature_text")]
    pub signature: Option<Signature>,
    pub explorer_url: Option<String>,
    pub error: Option<String>,
}

impl TransferResult {
    pub fn confirmed(signature: Signature, network: Network) -> Self {
        Self {
            success: true,
            status: TransferStatus::Confirmed,
            explorer_url: Some(network.explorer_tx_url(&signature.to_string())),
            signature: Some(signature),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            status: TransferStatus::Failed,
            signature: None,
            explorer_url: None,
            error: Some(error.into()),
        }
    }

    /// Submitted but unconfirmed. The signature is kept so an operator can
    /// look it up.
    pub fn unknown(signature: Option<Signature>, network: Network, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status: TransferStatus::Unknown,
            explorer_url: signature.map(|s| network.explorer_tx_url(&s.to_string())),
            signature,
            error: Some(error.into()),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.status == TransferStatus::Unknown
    }
}

/// Result of a batch transfer: one signature for every leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTransferResult {
    #[serde(flatten)]
    pub result: TransferResult,
    pub transfer_count: usize,
}

/// Result of moving escrow funds into a franchise wallet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingResult {
    #[serde(flatten)]
    pub result: TransferResult,
    pub franchise_wallet: WalletAddress,
    #[serde(with = "amount::sol")]
    pub amount: Lamports,
    pub network: Network,
}

/// Result of a faucet request on a test network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirdropResult {
    pub success: bool,
    pub status: TransferStatus,
    #[serde(with = "amount::sol::option", default, skip_serializing_if = "Option::is_none")]
    pub amount_airdropped: Option<Lamports>,
    #[serde(with = "amount::sol::option", default, skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<Lamports>,
    #[serde(with = "signature_text", default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AirdropResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            status: TransferStatus::Failed,
            amount_airdropped: None,
            new_balance: None,
            signature: None,
            explorer_url: None,
            error: Some(error.into()),
        }
    }

    /// The faucet accepted the request but the credit was not observed in
    /// time. Keeps the signature so the wallet can be reconciled.
    pub fn unknown(
        signature: Signature,
        requested: Lamports,
        network: Network,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            status: TransferStatus::Unknown,
            amount_airdropped: Some(requested),
            new_balance: None,
            explorer_url: Some(network.explorer_tx_url(&signature.to_string())),
            signature: Some(signature),
            error: Some(error.into()),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.status == TransferStatus::Unknown
    }
}

/// Base58 text form of an optional transaction signature.
mod signature_text {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::signature::Signature;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(
        signature: &Option<Signature>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match signature {
            Some(sig) => serializer.collect_str(sig),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Signature>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| Signature::from_str(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// On-chain versus recorded balance of one wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub address: WalletAddress,
    pub on_chain_balance: Lamports,
    /// `None` when the store has no record for the wallet.
    pub recorded_balance: Option<Lamports>,
    /// `on_chain - recorded`, in lamports.
    pub discrepancy: i128,
    /// Whether `|discrepancy|` exceeds the configured epsilon.
    pub drifted: bool,
}
