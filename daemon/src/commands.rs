//! Subcommands.

use anyhow::{bail, Context as _};
use clap::{Args, Subcommand};
use franchise_crypto::{keypair_from_secret_material, seed_of};
use franchise_rpc::RpcClient;
use franchise_settlement::{
    encrypt_keystore, load_keystore, save_keystore, AirdropUtility, BatchTransferExecutor,
    EscrowFunder, IdempotentExecutor, KeystoreSigner, PayoutAuthorization, PayoutGate,
    Reconciler, SettlementConfig, SettlementMetrics, Signer, SignerAddress, TransferExecutor,
    TransferLeg, TransferRequest,
};
use franchise_store::{
    FundingRound, JsonFileStore, TransferLogStore, WalletRecord, WalletRole, WalletStore,
};
use franchise_types::{amount, Lamports, TransferResult, WalletAddress};
use franchise_utils::{format_elapsed, format_sol};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Subcommand)]
pub enum Command {
    /// Send SOL from one wallet to another.
    Transfer {
        #[command(flatten)]
        signer: SignerArgs,
        /// Destination address.
        #[arg(long)]
        to: String,
        /// Amount in SOL, e.g. "0.25".
        #[arg(long)]
        amount: Lamports,
        #[arg(long, default_value = "")]
        description: String,
        /// Settle at most once under this key.
        #[arg(long)]
        idempotency_key: Option<String>,
    },

    /// Send several transfers in one atomic transaction.
    Batch {
        #[command(flatten)]
        signer: SignerArgs,
        /// JSON file: `[{"destination": "...", "amount": 1.5, "description": "..."}]`.
        #[arg(long)]
        legs: PathBuf,
        /// Settle the whole batch at most once under this key.
        #[arg(long)]
        idempotency_key: Option<String>,
    },

    /// Fund a franchise working-capital wallet from the platform wallet.
    Fund {
        #[command(flatten)]
        signer: SignerArgs,
        /// Franchise wallet address.
        #[arg(long)]
        to: WalletAddress,
        /// Amount in SOL.
        #[arg(long)]
        amount: Lamports,
        #[arg(long, default_value = "franchise funding")]
        description: String,
        /// Fund at most once under this key.
        #[arg(long)]
        idempotency_key: Option<String>,
    },

    /// Approve or execute the payout of a completed funding round.
    Payout {
        #[command(subcommand)]
        action: PayoutAction,
    },

    /// Compare on-chain balances with recorded balances.
    Reconcile {
        /// Wallets to check.
        #[arg(long = "address")]
        addresses: Vec<WalletAddress>,
        /// Check every stored wallet with this role.
        #[arg(long, value_parser = parse_role)]
        role: Option<WalletRole>,
        /// Write on-chain balances back for drifted wallets.
        #[arg(long)]
        sync: bool,
    },

    /// Request faucet funds on a test cluster.
    Airdrop {
        #[arg(long = "address", required = true)]
        addresses: Vec<WalletAddress>,
        /// Amount in SOL per wallet.
        #[arg(long, default_value = "1")]
        amount: Lamports,
        /// Pause between wallets, to stay under faucet rate limits.
        #[arg(long, default_value_t = 1_000)]
        delay_ms: u64,
    },

    /// Manage custodial wallets.
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },

    /// Load funding rounds exported by the marketplace (JSON array).
    ImportRounds { file: PathBuf },

    /// Release an idempotency key after reconciliation showed the transfer
    /// did not land.
    Release { key: String },
}

#[derive(Subcommand)]
pub enum PayoutAction {
    /// Approve paying out a round; writes the authorization to a file.
    Authorize {
        #[arg(long)]
        round: String,
        #[arg(long)]
        approver: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Execute a previously written authorization. Sign with the escrow wallet.
    Execute {
        #[command(flatten)]
        signer: SignerArgs,
        #[arg(long)]
        authorization: PathBuf,
        #[arg(long, default_value = "funding round payout")]
        description: String,
    },
}

#[derive(Subcommand)]
pub enum WalletAction {
    /// Record a wallet so role-wide reconciliation covers it.
    Register {
        #[arg(long)]
        address: WalletAddress,
        #[arg(long, value_parser = parse_role)]
        role: WalletRole,
        #[arg(long)]
        label: Option<String>,
    },
    /// Encrypt a Solana CLI keypair file into a keystore.
    Encrypt {
        /// Keypair file (JSON byte array).
        #[arg(long)]
        secret_file: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, env = "SETTLE_KEYSTORE_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
        /// Also store the keystore in the wallet record with this role.
        #[arg(long, value_parser = parse_role)]
        register: Option<WalletRole>,
    },
}

/// Where the signing key comes from.
#[derive(Args)]
pub struct SignerArgs {
    /// Solana CLI keypair file.
    #[arg(long, conflicts_with_all = ["keystore", "wallet"])]
    keypair: Option<PathBuf>,
    /// Encrypted keystore file.
    #[arg(long, conflicts_with = "wallet")]
    keystore: Option<PathBuf>,
    /// Use the keystore stored with this wallet's record.
    #[arg(long)]
    wallet: Option<WalletAddress>,
    #[arg(long, env = "SETTLE_KEYSTORE_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,
}

impl SignerArgs {
    fn load(&self, store: &JsonFileStore) -> anyhow::Result<Box<dyn Signer>> {
        if let Some(path) = &self.keypair {
            let material = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return Ok(Box::new(keypair_from_secret_material(&material)?));
        }
        let keystore = match (&self.keystore, &self.wallet) {
            (Some(path), _) => load_keystore(path)?,
            (None, Some(address)) => store
                .get_wallet(address)?
                .and_then(|record| record.keystore)
                .with_context(|| format!("no keystore recorded for {address}"))?,
            (None, None) => bail!("one of --keypair, --keystore or --wallet is required"),
        };
        let passphrase = self
            .passphrase
            .clone()
            .context("--passphrase or SETTLE_KEYSTORE_PASSPHRASE is required for keystores")?;
        Ok(Box::new(KeystoreSigner::new(keystore, passphrase)?))
    }
}

fn parse_role(s: &str) -> Result<WalletRole, String> {
    match s.to_ascii_lowercase().as_str() {
        "user" => Ok(WalletRole::User),
        "escrow" => Ok(WalletRole::Escrow),
        "platform" => Ok(WalletRole::Platform),
        "franchise" => Ok(WalletRole::Franchise),
        other => Err(format!("unknown wallet role: {other}")),
    }
}

#[derive(Deserialize)]
struct LegFile {
    destination: String,
    #[serde(with = "amount::sol")]
    amount: Lamports,
    #[serde(default)]
    description: String,
}

/// Shared clients for one invocation.
pub struct Context {
    pub config: SettlementConfig,
    pub rpc: Arc<RpcClient>,
    pub store: Arc<JsonFileStore>,
    pub metrics: Arc<SettlementMetrics>,
}

impl Context {
    pub fn new(config: SettlementConfig) -> anyhow::Result<Self> {
        let rpc = RpcClient::new(config.rpc_endpoint(), config.http_timeout());
        let store = JsonFileStore::open(&config.store_path)?;
        Ok(Self {
            rpc: Arc::new(rpc),
            store: Arc::new(store),
            metrics: Arc::new(SettlementMetrics::new()?),
            config,
        })
    }

    fn transfers(&self) -> TransferExecutor<RpcClient> {
        TransferExecutor::new(
            Arc::clone(&self.rpc),
            self.config.network,
            self.config.confirmation_policy(),
        )
        .with_metrics(Arc::clone(&self.metrics))
    }

    fn transfer_log(&self) -> Arc<dyn TransferLogStore + Send + Sync> {
        Arc::clone(&self.store) as Arc<dyn TransferLogStore + Send + Sync>
    }

    fn reconciler(&self) -> Reconciler<RpcClient, JsonFileStore> {
        Reconciler::new(
            Arc::clone(&self.rpc),
            Arc::clone(&self.store),
            self.config.commitment,
        )
        .with_epsilon(self.config.reconcile_epsilon())
        .with_concurrency(self.config.reconcile_concurrency)
        .with_metrics(Arc::clone(&self.metrics))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn finish(result: &TransferResult) -> anyhow::Result<()> {
    if result.success {
        Ok(())
    } else {
        bail!(
            "{}",
            result.error.as_deref().unwrap_or("transfer did not succeed")
        )
    }
}

pub async fn run(ctx: &Context, command: Command) -> anyhow::Result<()> {
    let started = Instant::now();
    let outcome = dispatch(ctx, command).await;
    tracing::info!(elapsed = %format_elapsed(started.elapsed()), ok = outcome.is_ok(), "done");
    outcome
}

async fn dispatch(ctx: &Context, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Transfer {
            signer,
            to,
            amount,
            description,
            idempotency_key,
        } => {
            let signer = signer.load(&ctx.store)?;
            let mut request = TransferRequest::new(to, amount, description);
            if let Some(key) = idempotency_key {
                request = request.with_idempotency_key(key);
            }
            let result = IdempotentExecutor::new(ctx.transfers(), Arc::clone(&ctx.store))
                .execute(signer.as_ref(), &request)
                .await;
            print_json(&result)?;
            finish(&result)
        }

        Command::Batch {
            signer,
            legs,
            idempotency_key,
        } => {
            let signer = signer.load(&ctx.store)?;
            let legs = read_legs(&legs)?;
            let result = BatchTransferExecutor::new(ctx.transfers())
                .with_transfer_log(ctx.transfer_log())
                .execute_batch(signer.as_ref(), &legs, idempotency_key.as_deref())
                .await;
            print_json(&result)?;
            finish(&result.result)
        }

        Command::Fund {
            signer,
            to,
            amount,
            description,
            idempotency_key,
        } => {
            let signer = signer.load(&ctx.store)?;
            let source = signer.address();
            let result = EscrowFunder::new(ctx.transfers())
                .with_transfer_log(ctx.transfer_log())
                .fund_franchise_wallet(
                    signer.as_ref(),
                    &source,
                    &to,
                    amount,
                    &description,
                    idempotency_key.as_deref(),
                )
                .await;
            print_json(&result)?;
            finish(&result.result)
        }

        Command::Payout { action } => payout(ctx, action).await,

        Command::Reconcile {
            addresses,
            role,
            sync,
        } => reconcile(ctx, addresses, role, sync).await,

        Command::Airdrop {
            addresses,
            amount,
            delay_ms,
        } => {
            let utility = AirdropUtility::new(
                Arc::clone(&ctx.rpc),
                ctx.config.network,
                ctx.config.confirmation_policy(),
            )
            .with_metrics(Arc::clone(&ctx.metrics));
            let mut failures = 0;
            for (i, address) in addresses.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                let result = utility.request_test_funds(address, amount).await;
                if !result.success {
                    failures += 1;
                }
                print_json(&result)?;
            }
            if failures > 0 {
                bail!("{failures} of {} airdrops failed", addresses.len());
            }
            Ok(())
        }

        Command::Wallet { action } => wallet(ctx, action),

        Command::ImportRounds { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let rounds: Vec<FundingRound> = serde_json::from_str(&text)?;
            for round in &rounds {
                ctx.store.insert_round(round)?;
            }
            println!("imported {} rounds", rounds.len());
            Ok(())
        }

        Command::Release { key } => {
            IdempotentExecutor::new(ctx.transfers(), Arc::clone(&ctx.store)).release(&key)?;
            println!("released {key}");
            Ok(())
        }
    }
}

fn read_legs(path: &Path) -> anyhow::Result<Vec<TransferLeg>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let legs: Vec<LegFile> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(legs
        .into_iter()
        .map(|leg| TransferLeg::new(leg.destination, leg.amount, leg.description))
        .collect())
}

async fn payout(ctx: &Context, action: PayoutAction) -> anyhow::Result<()> {
    match action {
        PayoutAction::Authorize {
            round,
            approver,
            out,
        } => {
            let authorization = PayoutGate::new(ctx.store.as_ref()).authorize(&round, &approver)?;
            std::fs::write(&out, serde_json::to_string_pretty(&authorization)?)
                .with_context(|| format!("writing {}", out.display()))?;
            println!(
                "authorized {} from {} to {} ({})",
                format_sol(authorization.amount),
                authorization.escrow_wallet,
                authorization.franchise_wallet,
                out.display()
            );
            Ok(())
        }
        PayoutAction::Execute {
            signer,
            authorization,
            description,
        } => {
            let signer = signer.load(&ctx.store)?;
            let text = std::fs::read_to_string(&authorization)
                .with_context(|| format!("reading {}", authorization.display()))?;
            let authorization: PayoutAuthorization = serde_json::from_str(&text)?;
            let result = EscrowFunder::new(ctx.transfers())
                .pay_out(ctx.store.as_ref(), &authorization, signer.as_ref(), &description)
                .await;
            print_json(&result)?;
            finish(&result.result)
        }
    }
}

async fn reconcile(
    ctx: &Context,
    addresses: Vec<WalletAddress>,
    role: Option<WalletRole>,
    sync: bool,
) -> anyhow::Result<()> {
    let reconciler = ctx.reconciler();
    let mut reports = reconciler.reconcile_many(&addresses).await;
    if let Some(role) = role {
        reports.extend(reconciler.reconcile_role(role).await?);
    }
    if reports.is_empty() {
        bail!("nothing to reconcile: pass --address or --role");
    }

    let mut errors = 0;
    for (address, outcome) in reports {
        match outcome {
            Ok(report) => {
                print_json(&report)?;
                if sync && report.drifted {
                    reconciler.sync(&report)?;
                }
            }
            Err(e) => {
                errors += 1;
                tracing::error!(address = %address, error = %e, "reconcile failed");
            }
        }
    }
    if errors > 0 {
        bail!("{errors} wallets could not be reconciled");
    }
    Ok(())
}

fn wallet(ctx: &Context, action: WalletAction) -> anyhow::Result<()> {
    match action {
        WalletAction::Register {
            address,
            role,
            label,
        } => {
            let mut record = ctx
                .store
                .get_wallet(&address)?
                .unwrap_or_else(|| WalletRecord::new(address.clone(), role));
            record.role = role;
            record.label = label.or(record.label);
            ctx.store.put_wallet(&record)?;
            println!("registered {address} as {role:?}");
            Ok(())
        }
        WalletAction::Encrypt {
            secret_file,
            out,
            passphrase,
            register,
        } => {
            let material = std::fs::read_to_string(&secret_file)
                .with_context(|| format!("reading {}", secret_file.display()))?;
            let keypair = keypair_from_secret_material(&material)?;
            let keystore = encrypt_keystore(&seed_of(&keypair), &passphrase)?;
            save_keystore(&keystore, &out)?;
            let address = keypair.address();
            if let Some(role) = register {
                let mut record = ctx
                    .store
                    .get_wallet(&address)?
                    .unwrap_or_else(|| WalletRecord::new(address.clone(), role));
                record.keystore = Some(keystore);
                ctx.store.put_wallet(&record)?;
            }
            println!("{address} -> {}", out.display());
            Ok(())
        }
    }
}
