//! Single native-token transfers.

use franchise_crypto::keypair_from_secret_material;
use franchise_rpc::{SendConfig, SolanaRpc};
use franchise_transactions::{
    check_size, transfer_instructions, unsigned_transaction, TransactionError,
};
use franchise_types::{Lamports, Network, TransferResult, WalletAddress};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::system_program;
use std::sync::Arc;

use crate::confirm::ConfirmationPolicy;
use crate::metrics::SettlementMetrics;
use crate::signer::{Signer, SignerAddress};
use crate::SettlementError;

/// One requested transfer. Fields are validated when it executes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub destination: String,
    pub amount: Lamports,
    pub description: String,
    /// Caller-supplied token; see `IdempotentExecutor`.
    pub idempotency_key: Option<String>,
}

impl TransferRequest {
    pub fn new(
        destination: impl Into<String>,
        amount: Lamports,
        description: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            amount,
            description: description.into(),
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Parse the destination and require a positive amount. The system
    /// program id parses as an address but cannot hold funds.
    pub fn validate(&self) -> Result<(WalletAddress, Lamports), SettlementError> {
        let destination = parse_address(&self.destination)?;
        if system_program::check_id(&destination.pubkey()) {
            return Err(SettlementError::InvalidAddress(format!(
                "{destination} is the system program, not a wallet"
            )));
        }
        if self.amount.is_zero() {
            return Err(SettlementError::NonPositiveAmount);
        }
        Ok((destination, self.amount))
    }
}

pub(crate) fn parse_address(raw: &str) -> Result<WalletAddress, SettlementError> {
    WalletAddress::parse(raw).map_err(|e| SettlementError::InvalidAddress(e.to_string()))
}

/// Convert a floating-point SOL amount, rejecting zero and negatives.
pub fn lamports_from_sol(sol: f64) -> Result<Lamports, SettlementError> {
    if sol <= 0.0 {
        return Err(SettlementError::NonPositiveAmount);
    }
    let lamports = Lamports::from_sol(sol)?;
    if lamports.is_zero() {
        return Err(SettlementError::NonPositiveAmount);
    }
    Ok(lamports)
}

/// Builds, signs, submits and confirms system transfers.
///
/// Every public operation returns a [`TransferResult`]; errors are logged and
/// folded into the record, never returned or panicked.
pub struct TransferExecutor<R> {
    rpc: Arc<R>,
    network: Network,
    policy: ConfirmationPolicy,
    metrics: Option<Arc<SettlementMetrics>>,
}

impl<R> Clone for TransferExecutor<R> {
    fn clone(&self) -> Self {
        Self {
            rpc: Arc::clone(&self.rpc),
            network: self.network,
            policy: self.policy,
            metrics: self.metrics.clone(),
        }
    }
}

impl<R: SolanaRpc> TransferExecutor<R> {
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

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    pub fn rpc(&self) -> &Arc<R> {
        &self.rpc
    }

    pub(crate) fn metrics(&self) -> Option<&SettlementMetrics> {
        self.metrics.as_deref()
    }

    /// Transfer from a signer-held wallet.
    pub async fn execute<S: Signer + ?Sized>(
        &self,
        signer: &S,
        request: &TransferRequest,
    ) -> TransferResult {
        match self.try_execute(signer, request).await {
            Ok(signature) => TransferResult::confirmed(signature, self.network),
            Err(e) => self.fail(e),
        }
    }

    /// Transfer using raw custodial secret material.
    ///
    /// `expected_source`, when given, must be the address derived from the
    /// secret; a mismatch fails before anything touches the network.
    pub async fn execute_with_secret(
        &self,
        secret_material: &str,
        expected_source: Option<&str>,
        destination: &str,
        amount_sol: f64,
        description: &str,
    ) -> TransferResult {
        let prepared = prepare_secret_transfer(
            secret_material,
            expected_source,
            destination,
            amount_sol,
            description,
        );
        match prepared {
            Ok((signer, request)) => self.execute(&signer, &request).await,
            Err(e) => self.fail(e),
        }
    }

    async fn try_execute<S: Signer + ?Sized>(
        &self,
        signer: &S,
        request: &TransferRequest,
    ) -> Result<Signature, SettlementError> {
        let (destination, lamports) = request.validate()?;
        let source = signer.try_pubkey()?;
        tracing::info!(
            source = %source,
            destination = %destination,
            lamports = lamports.raw(),
            description = %request.description,
            "submitting transfer"
        );
        let instructions = transfer_instructions(&source, &[(destination.pubkey(), lamports)]);
        self.send_instructions(signer, &instructions).await
    }

    /// Log and convert a failure into the outbound record.
    pub(crate) fn fail(&self, error: SettlementError) -> TransferResult {
        if let Some(m) = self.metrics() {
            if error.is_ambiguous() {
                m.transfers_unconfirmed.inc();
            } else {
                m.transfers_failed.inc();
            }
        }
        if error.is_ambiguous() {
            tracing::warn!(error = %error, "transfer outcome unknown");
        } else {
            tracing::error!(error = %error, "transfer failed");
        }
        error.into_result(self.network)
    }

    /// Shared pipeline: size check, blockhash, sign, submit with preflight,
    /// confirm. The signer is the fee payer.
    pub(crate) async fn send_instructions<S: Signer + ?Sized>(
        &self,
        signer: &S,
        instructions: &[Instruction],
    ) -> Result<Signature, SettlementError> {
        let payer = signer.try_pubkey()?;

        // Size does not depend on the blockhash; reject before any RPC call.
        check_size(&unsigned_transaction(&payer, instructions, Hash::default()))?;

        let latest = self.rpc.get_latest_blockhash(self.policy.commitment).await?;
        let mut transaction = unsigned_transaction(&payer, instructions, latest.blockhash);
        let signature = signer.try_sign_message(&transaction.message_data())?;
        let Some(slot) = transaction.signatures.first_mut() else {
            return Err(TransactionError::Encode("message has no signer".into()).into());
        };
        *slot = signature;

        let config = SendConfig {
            skip_preflight: false,
            preflight_commitment: self.policy.commitment,
            max_retries: None,
        };
        if let Some(m) = self.metrics() {
            m.transfers_submitted.inc();
        }
        if let Err(e) = self.rpc.send_transaction(&transaction, config).await {
            // Signed and possibly forwarded: only an explicit rejection is final.
            return Err(if e.is_definite_rejection() {
                e.into()
            } else {
                SettlementError::SubmitUncertain {
                    signature,
                    reason: e.to_string(),
                }
            });
        }
        tracing::debug!(signature = %signature, "submitted, awaiting confirmation");

        let elapsed = self
            .policy
            .await_confirmation(
                self.rpc.as_ref(),
                &signature,
                Some(latest.last_valid_block_height),
            )
            .await?;
        if let Some(m) = self.metrics() {
            m.transfers_confirmed.inc();
            m.confirmation_latency_ms.observe(elapsed.as_secs_f64() * 1_000.0);
        }
        tracing::info!(
            signature = %signature,
            commitment = %self.policy.commitment,
            explorer = %self.network.explorer_tx_url(&signature.to_string()),
            "transfer confirmed"
        );
        Ok(signature)
    }
}

fn prepare_secret_transfer(
    secret_material: &str,
    expected_source: Option<&str>,
    destination: &str,
    amount_sol: f64,
    description: &str,
) -> Result<(Keypair, TransferRequest), SettlementError> {
    let signer = keypair_from_secret_material(secret_material)?;
    if let Some(expected) = expected_source {
        if signer.address().as_str() != expected.trim() {
            return Err(SettlementError::PublicKeyMismatch);
        }
    }
    let amount = lamports_from_sol(amount_sol)?;
    Ok((signer, TransferRequest::new(destination, amount, description)))
}
