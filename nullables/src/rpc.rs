//! Nullable cluster: an in-memory ledger behind the `SolanaRpc` seam.
//!
//! Transactions are checked the way a validator would check them (signatures,
//! blockhash validity, fee payer solvency) and applied atomically. Preflight
//! simulation rejects a transaction that would fail, unless the sender skips
//! it, in which case it lands as failed and still pays the fee.

use franchise_rpc::{LatestBlockhash, RpcError, SendConfig, SignatureStatus, SolanaRpc};
use franchise_transactions::{system_transfers, SystemTransfer};
use franchise_types::{Commitment, Lamports, WalletAddress};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Fee charged to the fee payer for each signature.
pub const FEE_PER_SIGNATURE: Lamports = Lamports::new(5_000);

/// Blocks a blockhash stays valid after it is issued.
const BLOCKHASH_VALIDITY: u64 = 150;

const PREFLIGHT_FAILURE: i64 = -32002;
const SIGNATURE_FAILURE: i64 = -32003;

/// What happens to an accepted transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmitMode {
    /// Applied and visible as finalized.
    #[default]
    Land,
    /// Applied, but its status is never reported. Airdrops too.
    LandUnseen,
    /// Accepted by the node and then lost. Airdrops too.
    Drop,
}

#[derive(Default)]
struct Ledger {
    balances: HashMap<Pubkey, u64>,
    block_height: u64,
    /// Blocks added per `getBlockHeight` call.
    height_step: u64,
    blockhashes: HashMap<Hash, u64>,
    issued: u64,
    statuses: HashMap<Signature, SignatureStatus>,
    landed: Vec<Transaction>,
    mode: SubmitMode,
    fail_next_send: Option<RpcError>,
    fail_next_on_chain: Option<String>,
    airdrop_error: Option<String>,
    airdrops: u64,
}

/// Deterministic in-memory cluster for tests.
pub struct NullRpc {
    ledger: Mutex<Ledger>,
    calls: AtomicUsize,
    submissions: AtomicUsize,
}

impl NullRpc {
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                block_height: 1_000,
                ..Ledger::default()
            }),
            calls: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
        }
    }

    /// Set an account's balance.
    pub fn set_balance(&self, address: &WalletAddress, amount: Lamports) {
        self.ledger
            .lock()
            .unwrap()
            .balances
            .insert(address.pubkey(), amount.raw());
    }

    pub fn balance(&self, address: &WalletAddress) -> Lamports {
        let ledger = self.ledger.lock().unwrap();
        Lamports::new(
            ledger
                .balances
                .get(&address.pubkey())
                .copied()
                .unwrap_or(0),
        )
    }

    pub fn set_submit_mode(&self, mode: SubmitMode) {
        self.ledger.lock().unwrap().mode = mode;
    }

    /// Advance the chain by `step` blocks on every `getBlockHeight` call.
    pub fn set_height_step(&self, step: u64) {
        self.ledger.lock().unwrap().height_step = step;
    }

    /// Reject the next `sendTransaction` with `error`.
    pub fn fail_next_send(&self, error: RpcError) {
        self.ledger.lock().unwrap().fail_next_send = Some(error);
    }

    /// Land the next transaction as failed with `reason`; only the fee moves.
    pub fn fail_next_on_chain(&self, reason: impl Into<String>) {
        self.ledger.lock().unwrap().fail_next_on_chain = Some(reason.into());
    }

    /// Make every airdrop request fail with `message`.
    pub fn fail_airdrops(&self, message: impl Into<String>) {
        self.ledger.lock().unwrap().airdrop_error = Some(message.into());
    }

    /// Number of RPC calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `sendTransaction` calls, accepted or not.
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Transactions that were applied to the ledger.
    pub fn landed(&self) -> Vec<Transaction> {
        self.ledger.lock().unwrap().landed.clone()
    }

    fn count_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for NullRpc {
    fn default() -> Self {
        Self::new()
    }
}

fn preflight(message: impl Into<String>) -> RpcError {
    RpcError::JsonRpc {
        code: PREFLIGHT_FAILURE,
        message: format!("Transaction simulation failed: {}", message.into()),
    }
}

fn landed_status(ledger: &Ledger, err: Option<String>) -> SignatureStatus {
    SignatureStatus {
        slot: ledger.block_height,
        confirmations: None,
        err,
        confirmation_status: Some(Commitment::Finalized),
    }
}

impl Ledger {
    /// Total debit per account: fee on the payer plus every transfer leg.
    fn debits(&self, legs: &[SystemTransfer], payer: Pubkey, fee: u64) -> HashMap<Pubkey, u128> {
        let mut debits: HashMap<Pubkey, u128> = HashMap::new();
        *debits.entry(payer).or_default() += fee as u128;
        for leg in legs {
            *debits.entry(leg.from).or_default() += leg.lamports.raw() as u128;
        }
        debits
    }

    fn can_cover(&self, debits: &HashMap<Pubkey, u128>) -> bool {
        debits
            .iter()
            .all(|(key, need)| self.balances.get(key).copied().unwrap_or(0) as u128 >= *need)
    }

    fn apply(&mut self, legs: &[SystemTransfer]) {
        for leg in legs {
            *self.balances.entry(leg.from).or_default() -= leg.lamports.raw();
            *self.balances.entry(leg.to).or_default() += leg.lamports.raw();
        }
    }
}

impl SolanaRpc for NullRpc {
    async fn get_latest_blockhash(&self, _commitment: Commitment) -> Result<LatestBlockhash, RpcError> {
        self.count_call();
        let mut ledger = self.ledger.lock().unwrap();
        ledger.issued += 1;
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&ledger.issued.to_le_bytes());
        bytes[31] = 0xB1;
        let blockhash = Hash::new_from_array(bytes);
        let last_valid_block_height = ledger.block_height + BLOCKHASH_VALIDITY;
        ledger.blockhashes.insert(blockhash, last_valid_block_height);
        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
        config: SendConfig,
    ) -> Result<Signature, RpcError> {
        self.count_call();
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let mut ledger = self.ledger.lock().unwrap();

        if let Some(err) = ledger.fail_next_send.take() {
            return Err(err);
        }
        if transaction.verify().is_err() {
            return Err(RpcError::JsonRpc {
                code: SIGNATURE_FAILURE,
                message: "Transaction signature verification failure".into(),
            });
        }
        let (Some(signature), Some(payer)) = (
            transaction.signatures.first().copied(),
            transaction.message.account_keys.first().copied(),
        ) else {
            return Err(preflight("transaction has no fee payer"));
        };
        let legs = system_transfers(&transaction.message).map_err(|e| preflight(e.to_string()))?;
        match ledger.blockhashes.get(&transaction.message.recent_blockhash) {
            Some(last_valid) if *last_valid >= ledger.block_height => {}
            _ => return Err(preflight("Blockhash not found")),
        }

        let fee = FEE_PER_SIGNATURE.raw() * transaction.signatures.len() as u64;
        if ledger.balances.get(&payer).copied().unwrap_or(0) < fee {
            return Err(preflight(
                "Attempt to debit an account but found no record of a prior credit.",
            ));
        }
        let covered = ledger.can_cover(&ledger.debits(&legs, payer, fee));
        if !covered && !config.skip_preflight {
            return Err(preflight("insufficient lamports for transfer"));
        }

        let mode = ledger.mode;
        if mode == SubmitMode::Drop {
            return Ok(signature);
        }

        *ledger.balances.entry(payer).or_default() -= fee;
        let on_chain_error = match ledger.fail_next_on_chain.take() {
            Some(reason) => Some(reason),
            None if !covered => Some("insufficient lamports for transfer".to_string()),
            None => {
                ledger.apply(&legs);
                None
            }
        };
        ledger.landed.push(transaction.clone());
        if mode == SubmitMode::Land {
            let status = landed_status(&ledger, on_chain_error);
            ledger.statuses.insert(signature, status);
        }
        Ok(signature)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, RpcError> {
        self.count_call();
        Ok(self.ledger.lock().unwrap().statuses.get(signature).cloned())
    }

    async fn get_balance(
        &self,
        address: &WalletAddress,
        _commitment: Commitment,
    ) -> Result<Lamports, RpcError> {
        self.count_call();
        Ok(self.balance(address))
    }

    async fn get_block_height(&self, _commitment: Commitment) -> Result<u64, RpcError> {
        self.count_call();
        let mut ledger = self.ledger.lock().unwrap();
        ledger.block_height += ledger.height_step;
        Ok(ledger.block_height)
    }

    async fn request_airdrop(
        &self,
        address: &WalletAddress,
        amount: Lamports,
    ) -> Result<Signature, RpcError> {
        self.count_call();
        let mut ledger = self.ledger.lock().unwrap();
        if let Some(message) = ledger.airdrop_error.clone() {
            return Err(RpcError::JsonRpc {
                code: -32603,
                message,
            });
        }
        ledger.airdrops += 1;
        let mut bytes = [0u8; 64];
        bytes[..8].copy_from_slice(&ledger.airdrops.to_le_bytes());
        bytes[63] = 0xA1;
        let signature = Signature::from(bytes);

        if ledger.mode == SubmitMode::Drop {
            return Ok(signature);
        }
        *ledger.balances.entry(address.pubkey()).or_default() += amount.raw();
        if ledger.mode == SubmitMode::Land {
            let status = landed_status(&ledger, None);
            ledger.statuses.insert(signature, status);
        }
        Ok(signature)
    }
}
