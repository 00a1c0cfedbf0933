//! End-to-end settlement flows against the in-memory cluster:
//! sign → submit → confirm → ledger effects → reconciliation.

use std::sync::Arc;
use std::time::Duration;

use franchise_crypto::keypair_from_seed;
use franchise_nullables::{NullRpc, NullStore, SubmitMode, FEE_PER_SIGNATURE};
use franchise_rpc::RpcError;
use franchise_settlement::{
    encrypt_keystore_with, AirdropUtility, BatchTransferExecutor, ConfirmationPolicy,
    EscrowFunder, IdempotentExecutor, KeystoreSigner, PayoutGate, Reconciler, SettlementMetrics,
    SignerAddress, TransferExecutor, TransferLeg, TransferRequest,
};
use franchise_store::{FundingRound, KdfParams, TransferLogStore, WalletRole};
use franchise_types::{
    Commitment, Lamports, Network, TransferStatus, WalletAddress, LAMPORTS_PER_SOL,
};
use solana_sdk::signature::Keypair;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sol(whole: u64) -> Lamports {
    Lamports::new(whole * LAMPORTS_PER_SOL)
}

fn policy() -> ConfirmationPolicy {
    ConfirmationPolicy {
        commitment: Commitment::Confirmed,
        timeout: Duration::from_millis(100),
        poll_interval: Duration::from_millis(5),
    }
}

fn executor(rpc: &Arc<NullRpc>) -> TransferExecutor<NullRpc> {
    TransferExecutor::new(Arc::clone(rpc), Network::Devnet, policy())
}

fn signer(seed: u8) -> Keypair {
    keypair_from_seed(&[seed; 32]).unwrap()
}

fn address(seed: u8) -> WalletAddress {
    signer(seed).address()
}

/// Solana CLI keypair file contents: `[seed.., pubkey..]`.
fn secret_material(seed: u8) -> String {
    serde_json::to_string(&signer(seed).to_bytes().to_vec()).unwrap()
}

fn funded(seed: u8, amount: Lamports) -> (Arc<NullRpc>, Keypair) {
    let rpc = Arc::new(NullRpc::new());
    rpc.set_balance(&address(seed), amount);
    (rpc, signer(seed))
}

// ---------------------------------------------------------------------------
// Transfer Executor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tiny_transfer_moves_exact_lamports_and_reconciles() {
    let (rpc, source) = funded(1, sol(1));
    let store = Arc::new(NullStore::new());
    store.insert_wallet(address(2), WalletRole::Franchise, Lamports::ZERO);

    let result = executor(&rpc)
        .execute_with_secret(
            &secret_material(1),
            Some(source.address().as_str()),
            address(2).as_str(),
            0.0001,
            "test transfer",
        )
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.status, TransferStatus::Confirmed);
    let sig = result.signature.unwrap();
    assert_eq!(
        result.explorer_url.unwrap(),
        format!("https://explorer.solana.com/tx/{sig}?cluster=devnet")
    );
    assert_eq!(rpc.balance(&address(2)), Lamports::new(100_000));
    assert_eq!(
        rpc.balance(&source.address()),
        sol(1) - Lamports::new(100_000) - FEE_PER_SIGNATURE
    );

    let reconciler = Reconciler::new(rpc.clone(), store, Commitment::Confirmed);
    let report = reconciler.reconcile(&address(2)).await.unwrap();
    assert_eq!(report.discrepancy, 100_000);
    reconciler.sync(&report).unwrap();
    let report = reconciler.reconcile(&address(2)).await.unwrap();
    assert_eq!(report.discrepancy, 0);
    assert!(!report.drifted);
}

#[tokio::test]
async fn mismatched_source_fails_before_any_rpc_call() {
    let (rpc, _) = funded(1, sol(1));
    let result = executor(&rpc)
        .execute_with_secret(
            &secret_material(1),
            Some(address(9).as_str()),
            address(2).as_str(),
            1.0,
            "wrong wallet",
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.status, TransferStatus::Failed);
    assert_eq!(result.error.as_deref(), Some("Public key does not match secret key"));
    assert!(result.signature.is_none());
    assert_eq!(rpc.calls(), 0);
}

#[tokio::test]
async fn malformed_secret_is_reported_not_raised() {
    let (rpc, _) = funded(1, sol(1));
    let result = executor(&rpc)
        .execute_with_secret("[1, 2, 3]", None, address(2).as_str(), 1.0, "bad key")
        .await;
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("Invalid secret key format"));
    assert_eq!(rpc.calls(), 0);
}

#[tokio::test]
async fn invalid_destination_and_zero_amount_fail_without_rpc() {
    let (rpc, source) = funded(1, sol(1));
    let exec = executor(&rpc);

    let bad_dest = exec
        .execute(&source, &TransferRequest::new("0OIl", sol(1), "bad"))
        .await;
    assert!(bad_dest.error.unwrap().contains("invalid address"));

    let zero = exec
        .execute(&source, &TransferRequest::new(address(2).as_str(), Lamports::ZERO, "zero"))
        .await;
    assert!(zero.error.unwrap().contains("greater than zero"));
    assert_eq!(rpc.calls(), 0);
}

#[tokio::test]
async fn overdraft_is_rejected_by_preflight() {
    let (rpc, source) = funded(1, Lamports::new(50_000));
    let result = executor(&rpc)
        .execute(&source, &TransferRequest::new(address(2).as_str(), sol(1), "too much"))
        .await;
    assert!(!result.success);
    assert_eq!(result.status, TransferStatus::Failed);
    assert!(result.error.unwrap().contains("simulation failed"));
    assert_eq!(rpc.balance(&source.address()), Lamports::new(50_000));
    assert!(rpc.landed().is_empty());
}

#[tokio::test]
async fn on_chain_failure_is_definite() {
    let (rpc, source) = funded(1, sol(1));
    rpc.fail_next_on_chain("InstructionError(0, Custom(1))");
    let result = executor(&rpc)
        .execute(&source, &TransferRequest::new(address(2).as_str(), Lamports::new(10), "x"))
        .await;
    assert_eq!(result.status, TransferStatus::Failed);
    assert!(result.error.unwrap().contains("transaction failed on-chain"));
    assert!(rpc.balance(&address(2)).is_zero());
}

#[tokio::test]
async fn unobserved_transfer_is_unknown_with_signature() {
    let (rpc, source) = funded(1, sol(1));
    rpc.set_submit_mode(SubmitMode::LandUnseen);
    let result = executor(&rpc)
        .execute(&source, &TransferRequest::new(address(2).as_str(), Lamports::new(10), "x"))
        .await;
    assert!(!result.success);
    assert_eq!(result.status, TransferStatus::Unknown);
    assert!(result.signature.is_some());
    assert!(result.explorer_url.is_some());
    assert!(result.error.unwrap().contains("reconcile before retrying"));
    // It did land; only reconciliation can tell.
    assert_eq!(rpc.balance(&address(2)), Lamports::new(10));
}

#[tokio::test]
async fn dropped_transfer_expires_with_its_blockhash() {
    let (rpc, source) = funded(1, sol(1));
    rpc.set_submit_mode(SubmitMode::Drop);
    rpc.set_height_step(100);
    let result = executor(&rpc)
        .execute(&source, &TransferRequest::new(address(2).as_str(), Lamports::new(10), "x"))
        .await;
    assert_eq!(result.status, TransferStatus::Failed);
    assert!(result.error.unwrap().contains("blockhash expired"));
}

#[tokio::test]
async fn interrupted_submission_is_ambiguous() {
    let (rpc, source) = funded(1, sol(1));
    rpc.fail_next_send(RpcError::Transport("connection reset".into()));
    let result = executor(&rpc)
        .execute(&source, &TransferRequest::new(address(2).as_str(), Lamports::new(10), "x"))
        .await;
    assert_eq!(result.status, TransferStatus::Unknown);
    assert!(result.signature.is_some());
}

#[tokio::test]
async fn gateway_timeout_on_submit_keeps_signature() {
    let (rpc, source) = funded(1, sol(1));
    rpc.fail_next_send(RpcError::Http(504));
    let result = executor(&rpc)
        .execute(&source, &TransferRequest::new(address(2).as_str(), Lamports::new(10), "x"))
        .await;
    assert_eq!(result.status, TransferStatus::Unknown);
    assert!(result.signature.is_some());
    assert!(result.error.unwrap().contains("HTTP 504"));
}

#[tokio::test]
async fn unreadable_submit_reply_is_ambiguous() {
    let (rpc, source) = funded(1, sol(1));
    rpc.fail_next_send(RpcError::InvalidResponse("truncated body".into()));
    let result = executor(&rpc)
        .execute(&source, &TransferRequest::new(address(2).as_str(), Lamports::new(10), "x"))
        .await;
    assert_eq!(result.status, TransferStatus::Unknown);
    assert!(result.signature.is_some());
}

#[tokio::test]
async fn node_rejection_on_submit_is_definite() {
    let (rpc, source) = funded(1, sol(1));
    rpc.fail_next_send(RpcError::JsonRpc {
        code: -32005,
        message: "Node is unhealthy".into(),
    });
    let result = executor(&rpc)
        .execute(&source, &TransferRequest::new(address(2).as_str(), Lamports::new(10), "x"))
        .await;
    assert_eq!(result.status, TransferStatus::Failed);
    assert!(result.signature.is_none());
}

#[tokio::test]
async fn keystore_signer_settles_transfers() {
    let seed = [3u8; 32];
    let cheap = KdfParams {
        memory: 1024,
        iterations: 1,
        parallelism: 1,
    };
    let keystore = encrypt_keystore_with(&seed, "operator pass", cheap).unwrap();
    let sealed = KeystoreSigner::new(keystore, "operator pass").unwrap();

    let (rpc, _) = funded(3, sol(2));
    let result = executor(&rpc)
        .execute(&sealed, &TransferRequest::new(address(4).as_str(), sol(1), "custodial"))
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(rpc.balance(&address(4)), sol(1));
}

#[tokio::test]
async fn metrics_track_outcomes() {
    let (rpc, source) = funded(1, sol(1));
    let metrics = Arc::new(SettlementMetrics::new().unwrap());
    let exec = executor(&rpc).with_metrics(metrics.clone());

    exec.execute(&source, &TransferRequest::new(address(2).as_str(), Lamports::new(10), "ok"))
        .await;
    exec.execute(&source, &TransferRequest::new("bad", Lamports::new(10), "bad"))
        .await;

    assert_eq!(metrics.transfers_submitted.get(), 1);
    assert_eq!(metrics.transfers_confirmed.get(), 1);
    assert_eq!(metrics.transfers_failed.get(), 1);
    assert!(metrics.encode().unwrap().contains("settlement_transfers_failed_total 1"));
}

// ---------------------------------------------------------------------------
// Batch Transfer Executor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_lands_atomically_with_one_fee() {
    let (rpc, source) = funded(1, sol(10));
    let legs: Vec<TransferLeg> = (2..=4u8)
        .map(|seed| TransferLeg::new(address(seed).as_str(), sol(1), format!("leg {seed}")))
        .collect();

    let batch = BatchTransferExecutor::new(executor(&rpc))
        .execute_batch(&source, &legs, None)
        .await;

    assert!(batch.result.success, "{:?}", batch.result.error);
    assert_eq!(batch.transfer_count, 3);
    for seed in 2..=4u8 {
        assert_eq!(rpc.balance(&address(seed)), sol(1));
    }
    assert_eq!(rpc.balance(&source.address()), sol(7) - FEE_PER_SIGNATURE);
    assert_eq!(rpc.submissions(), 1);
}

#[tokio::test]
async fn batch_with_malformed_leg_submits_nothing() {
    let (rpc, source) = funded(1, sol(10));
    let legs = vec![
        TransferLeg::new(address(2).as_str(), sol(1), "good"),
        TransferLeg::new("definitely not base58!", sol(1), "bad"),
        TransferLeg::new(address(3).as_str(), Lamports::ZERO, "zero"),
    ];

    let batch = BatchTransferExecutor::new(executor(&rpc))
        .execute_batch(&source, &legs, None)
        .await;

    assert!(!batch.result.success);
    assert!(batch.result.error.unwrap().contains("leg 1"));
    assert_eq!(rpc.submissions(), 0);
    assert_eq!(rpc.calls(), 0);
    assert_eq!(rpc.balance(&source.address()), sol(10));
    assert!(rpc.balance(&address(2)).is_zero());
}

#[tokio::test]
async fn empty_batch_fails_fast() {
    let (rpc, source) = funded(1, sol(1));
    let batch = BatchTransferExecutor::new(executor(&rpc))
        .execute_batch(&source, &[], None)
        .await;
    assert!(!batch.result.success);
    assert_eq!(batch.transfer_count, 0);
    assert_eq!(rpc.calls(), 0);
}

#[tokio::test]
async fn system_program_leg_fails_the_batch() {
    let (rpc, source) = funded(1, sol(10));
    let legs = vec![
        TransferLeg::new(address(2).as_str(), sol(1), "good"),
        TransferLeg::new("11111111111111111111111111111111", sol(1), "burn"),
    ];
    let batch = BatchTransferExecutor::new(executor(&rpc))
        .execute_batch(&source, &legs, None)
        .await;
    let error = batch.result.error.unwrap();
    assert!(error.contains("leg 1"));
    assert!(error.contains("system program"));
    assert_eq!(rpc.calls(), 0);
}

#[tokio::test]
async fn keyed_batch_replays_instead_of_paying_twice() {
    let (rpc, source) = funded(1, sol(10));
    let log = Arc::new(NullStore::new());
    let batch = BatchTransferExecutor::new(executor(&rpc)).with_transfer_log(log.clone());
    let legs: Vec<TransferLeg> = (2..=3u8)
        .map(|seed| TransferLeg::new(address(seed).as_str(), sol(1), "payroll"))
        .collect();

    let first = batch.execute_batch(&source, &legs, Some("payroll-2024-06")).await;
    let second = batch.execute_batch(&source, &legs, Some("payroll-2024-06")).await;

    assert!(first.result.success, "{:?}", first.result.error);
    assert_eq!(first, second);
    assert_eq!(rpc.submissions(), 1);
    assert_eq!(rpc.balance(&address(2)), sol(1));
    let entry = log.get_entry("payroll-2024-06").unwrap().unwrap();
    assert_eq!(entry.destinations, vec![address(2), address(3)]);
    assert_eq!(entry.total, sol(2));
}

#[tokio::test]
async fn keyed_batch_without_a_log_is_refused() {
    let (rpc, source) = funded(1, sol(10));
    let legs = vec![TransferLeg::new(address(2).as_str(), sol(1), "x")];
    let batch = BatchTransferExecutor::new(executor(&rpc))
        .execute_batch(&source, &legs, Some("k"))
        .await;
    assert!(batch.result.error.unwrap().contains("no transfer log"));
    assert_eq!(rpc.calls(), 0);
}

#[tokio::test]
async fn oversized_batch_is_rejected_before_submission() {
    let (rpc, source) = funded(1, sol(100));
    let legs: Vec<TransferLeg> = (10..40u8)
        .map(|seed| TransferLeg::new(address(seed).as_str(), Lamports::new(1), "dust"))
        .collect();
    let batch = BatchTransferExecutor::new(executor(&rpc))
        .execute_batch(&source, &legs, None)
        .await;
    assert!(batch.result.error.unwrap().starts_with("batch too large"));
    assert_eq!(rpc.calls(), 0);
}

// ---------------------------------------------------------------------------
// Escrow Funding Procedure + payout gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insufficient_platform_balance_names_both_figures() {
    let (rpc, platform) = funded(1, sol(10));
    let funder = EscrowFunder::new(executor(&rpc));

    let funding = funder
        .fund_franchise_wallet(&platform, &platform.address(), &address(5), sol(12), "capital", None)
        .await;

    assert!(!funding.result.success);
    assert_eq!(
        funding.result.error.as_deref(),
        Some("Insufficient platform wallet balance. Have: 10.0000, Need: 12.0")
    );
    assert_eq!(rpc.submissions(), 0);
    assert_eq!(funding.amount, sol(12));
    assert_eq!(funding.network, Network::Devnet);
}

#[tokio::test]
async fn funding_moves_capital_into_franchise_wallet() {
    let (rpc, platform) = funded(1, sol(20));
    let funding = EscrowFunder::new(executor(&rpc))
        .fund_franchise_wallet(&platform, &platform.address(), &address(5), sol(12), "capital", None)
        .await;

    assert!(funding.result.success, "{:?}", funding.result.error);
    assert_eq!(rpc.balance(&address(5)), sol(12));
    let json = serde_json::to_value(&funding).unwrap();
    assert_eq!(json["amount"], 12.0);
    assert_eq!(json["network"], "devnet");
    assert_eq!(json["franchiseWallet"], address(5).as_str());
}

#[tokio::test]
async fn funding_refuses_signer_for_another_wallet() {
    let (rpc, platform) = funded(1, sol(20));
    let funding = EscrowFunder::new(executor(&rpc))
        .fund_franchise_wallet(&platform, &address(7), &address(5), sol(1), "capital", None)
        .await;
    assert_eq!(
        funding.result.error.as_deref(),
        Some("Public key does not match secret key")
    );
    assert_eq!(rpc.calls(), 0);
}

#[tokio::test]
async fn authorized_payout_drains_escrow_to_franchise() {
    let (rpc, escrow) = funded(1, sol(50));
    let store = NullStore::new();
    store.insert_round(FundingRound {
        id: "round-7".into(),
        franchise: "Taco Town".into(),
        escrow_wallet: escrow.address(),
        franchise_wallet: Some(address(5)),
        target: sol(40),
        raised: sol(45),
        contributor_count: 12,
    });

    let authorization = PayoutGate::new(&store)
        .authorize("round-7", "cfo@example.com")
        .unwrap();
    let funding = EscrowFunder::new(executor(&rpc))
        .pay_out(&store, &authorization, &escrow, "round-7 payout")
        .await;

    assert!(funding.result.success, "{:?}", funding.result.error);
    assert_eq!(rpc.balance(&address(5)), sol(45));

    // Someone else's key cannot execute the same approval.
    let intruder = signer(9);
    let refused = EscrowFunder::new(executor(&rpc))
        .pay_out(&store, &authorization, &intruder, "again")
        .await;
    assert!(refused.result.error.unwrap().starts_with("payout not authorized"));
    assert_eq!(rpc.submissions(), 1);
}

#[tokio::test]
async fn keyed_funding_runs_once() {
    let (rpc, platform) = funded(1, sol(20));
    let log = Arc::new(NullStore::new());
    let funder = EscrowFunder::new(executor(&rpc)).with_transfer_log(log);
    let platform_address = platform.address();
    let destination = address(5);
    let fund = || {
        funder.fund_franchise_wallet(
            &platform,
            &platform_address,
            &destination,
            sol(3),
            "capital",
            Some("fund-5"),
        )
    };

    let first = fund().await;
    let second = fund().await;
    assert!(first.result.success, "{:?}", first.result.error);
    assert_eq!(first, second);
    assert_eq!(rpc.balance(&address(5)), sol(3));
    assert_eq!(rpc.submissions(), 1);
}

#[tokio::test]
async fn repeated_payout_of_one_authorization_pays_once() {
    let (rpc, escrow) = funded(1, sol(100));
    let store = NullStore::new();
    store.insert_round(FundingRound {
        id: "round-8".into(),
        franchise: "Noodle Nook".into(),
        escrow_wallet: escrow.address(),
        franchise_wallet: Some(address(5)),
        target: sol(40),
        raised: sol(45),
        contributor_count: 9,
    });

    let authorization = PayoutGate::new(&store).authorize("round-8", "cfo").unwrap();
    let funder = EscrowFunder::new(executor(&rpc));
    let first = funder.pay_out(&store, &authorization, &escrow, "payout").await;
    let second = funder.pay_out(&store, &authorization, &escrow, "payout").await;

    assert!(first.result.success, "{:?}", first.result.error);
    assert_eq!(first, second);
    assert_eq!(rpc.submissions(), 1);
    assert_eq!(rpc.balance(&address(5)), sol(45));

    // A fresh approval for the same round is refused too.
    let again = PayoutGate::new(&store).authorize("round-8", "cfo").unwrap_err();
    assert!(again.to_string().contains("already paid out"));
}

#[tokio::test]
async fn payout_with_unknown_outcome_blocks_a_second_attempt() {
    let (rpc, escrow) = funded(1, sol(100));
    rpc.set_submit_mode(SubmitMode::LandUnseen);
    let store = NullStore::new();
    store.insert_round(FundingRound {
        id: "round-9".into(),
        franchise: "Pie Place".into(),
        escrow_wallet: escrow.address(),
        franchise_wallet: Some(address(5)),
        target: sol(10),
        raised: sol(10),
        contributor_count: 2,
    });

    let authorization = PayoutGate::new(&store).authorize("round-9", "cfo").unwrap();
    let funder = EscrowFunder::new(executor(&rpc));
    let first = funder.pay_out(&store, &authorization, &escrow, "payout").await;
    assert_eq!(first.result.status, TransferStatus::Unknown);

    let second = funder.pay_out(&store, &authorization, &escrow, "payout").await;
    assert_eq!(second.result.status, TransferStatus::Unknown);
    assert!(second.result.error.unwrap().contains("payout:round-9"));
    assert_eq!(rpc.submissions(), 1);
    assert_eq!(rpc.balance(&address(5)), sol(10));
}

// ---------------------------------------------------------------------------
// Balance Reconciliation Job
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reconcile_is_idempotent_without_chain_activity() {
    let rpc = Arc::new(NullRpc::new());
    let store = Arc::new(NullStore::new());
    rpc.set_balance(&address(1), Lamports::new(7_777));
    store.insert_wallet(address(1), WalletRole::Escrow, Lamports::new(7_000));

    let reconciler = Reconciler::new(rpc, store, Commitment::Confirmed)
        .with_epsilon(Lamports::new(1));
    let first = reconciler.reconcile(&address(1)).await.unwrap();
    let second = reconciler.reconcile(&address(1)).await.unwrap();
    assert_eq!(first, second);
    assert!(first.drifted);
}

// ---------------------------------------------------------------------------
// Airdrop Utility
// ---------------------------------------------------------------------------

#[tokio::test]
async fn devnet_airdrop_reports_amount_and_new_balance() {
    let rpc = Arc::new(NullRpc::new());
    let utility = AirdropUtility::new(rpc.clone(), Network::Devnet, policy());

    let result = utility.request_test_funds(&address(6), sol(2)).await;

    assert!(result.success, "{:?}", result.error);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["amountAirdropped"], 2.0);
    assert_eq!(json["newBalance"], 2.0);
    assert!(result.explorer_url.unwrap().ends_with("?cluster=devnet"));
}

// ---------------------------------------------------------------------------
// Idempotent transfers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replayed_key_returns_recorded_result() {
    let (rpc, source) = funded(1, sol(5));
    let log = Arc::new(NullStore::new());
    let idem = IdempotentExecutor::new(executor(&rpc), log.clone());
    let request =
        TransferRequest::new(address(2).as_str(), sol(1), "invoice 42").with_idempotency_key("inv-42");

    let first = idem.execute(&source, &request).await;
    let second = idem.execute(&source, &request).await;

    assert!(first.success);
    assert_eq!(first, second);
    assert_eq!(rpc.submissions(), 1);
    assert_eq!(rpc.balance(&address(2)), sol(1));
    assert!(log.get_entry("inv-42").unwrap().unwrap().is_settled());
}

#[tokio::test]
async fn ambiguous_key_blocks_retry_until_released() {
    let (rpc, source) = funded(1, sol(5));
    rpc.set_submit_mode(SubmitMode::Drop);
    let log = Arc::new(NullStore::new());
    let idem = IdempotentExecutor::new(executor(&rpc), log.clone());
    let request =
        TransferRequest::new(address(2).as_str(), sol(1), "invoice 43").with_idempotency_key("inv-43");

    let first = idem.execute(&source, &request).await;
    assert_eq!(first.status, TransferStatus::Unknown);

    let retry = idem.execute(&source, &request).await;
    assert_eq!(retry.status, TransferStatus::Unknown);
    assert!(retry.error.unwrap().contains("inv-43"));
    assert_eq!(rpc.submissions(), 1);

    // Reconciliation shows nothing landed; the operator frees the key.
    assert!(rpc.balance(&address(2)).is_zero());
    idem.release("inv-43").unwrap();
    rpc.set_submit_mode(SubmitMode::Land);
    let third = idem.execute(&source, &request).await;
    assert!(third.success, "{:?}", third.error);
    assert_eq!(rpc.submissions(), 2);
}
