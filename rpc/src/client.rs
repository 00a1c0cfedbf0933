//! Adapter from [`SolanaRpc`] onto `solana_client`'s nonblocking client.

use std::time::Duration;

use franchise_types::{Commitment, Lamports, WalletAddress};
use solana_client::nonblocking::rpc_client::RpcClient as NodeClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::{commitment_config, LatestBlockhash, RpcError, SendConfig, SignatureStatus, SolanaRpc};

/// Client for a single cluster endpoint.
///
/// Cheap to share: wrap it in an `Arc` or hand out references.
pub struct RpcClient {
    node: NodeClient,
}

impl RpcClient {
    /// Create a client for `url` with the given per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            node: NodeClient::new_with_timeout(url.into(), timeout),
        }
    }

    pub fn url(&self) -> String {
        self.node.url()
    }
}

impl SolanaRpc for RpcClient {
    async fn get_latest_blockhash(&self, commitment: Commitment) -> Result<LatestBlockhash, RpcError> {
        let (blockhash, last_valid_block_height) = self
            .node
            .get_latest_blockhash_with_commitment(commitment_config(commitment))
            .await?;
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
        let options = RpcSendTransactionConfig {
            skip_preflight: config.skip_preflight,
            preflight_commitment: Some(commitment_config(config.preflight_commitment).commitment),
            max_retries: config.max_retries,
            ..RpcSendTransactionConfig::default()
        };
        self.node
            .send_transaction_with_config(transaction, options)
            .await
            .map_err(|e| {
                let err = RpcError::from(e);
                tracing::debug!(error = %err, "sendTransaction failed");
                err
            })
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, RpcError> {
        let response = self
            .node
            .get_signature_statuses_with_history(&[*signature])
            .await?;
        Ok(response.value.into_iter().next().flatten().map(|status| {
            let confirmation_status =
                [Commitment::Finalized, Commitment::Confirmed, Commitment::Processed]
                    .into_iter()
                    .find(|level| status.satisfies_commitment(commitment_config(*level)));
            SignatureStatus {
                slot: status.slot,
                confirmations: status.confirmations.map(|c| c as u64),
                err: status.err.map(|e| e.to_string()),
                confirmation_status,
            }
        }))
    }

    async fn get_balance(
        &self,
        address: &WalletAddress,
        commitment: Commitment,
    ) -> Result<Lamports, RpcError> {
        let response = self
            .node
            .get_balance_with_commitment(&address.pubkey(), commitment_config(commitment))
            .await?;
        Ok(Lamports::new(response.value))
    }

    async fn get_block_height(&self, commitment: Commitment) -> Result<u64, RpcError> {
        Ok(self
            .node
            .get_block_height_with_commitment(commitment_config(commitment))
            .await?)
    }

    async fn request_airdrop(
        &self,
        address: &WalletAddress,
        amount: Lamports,
    ) -> Result<Signature, RpcError> {
        Ok(self
            .node
            .request_airdrop(&address.pubkey(), amount.raw())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use franchise_crypto::generate_keypair;
    use franchise_transactions::{transfer_instructions, unsigned_transaction};
    use serde_json::{json, Value};
    use solana_sdk::hash::Hash;
    use solana_sdk::signer::Signer;
    use std::sync::{Arc, Mutex};

    /// Canned responses keyed by method, plus a log of received requests.
    #[derive(Default)]
    struct FakeNode {
        responses: Mutex<Vec<(&'static str, Value)>>,
        seen: Mutex<Vec<Value>>,
    }

    impl FakeNode {
        fn calls(&self, method: &str) -> Vec<Value> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .filter(|req| req["method"] == method)
                .cloned()
                .collect()
        }
    }

    async fn handle(State(node): State<Arc<FakeNode>>, Json(req): Json<Value>) -> Json<Value> {
        node.seen.lock().unwrap().push(req.clone());
        let method = req["method"].as_str().unwrap_or_default().to_string();
        let reply = if method == "getVersion" {
            json!({ "solana-core": "1.18.22", "feature-set": 3469865029u32 })
        } else {
            node.responses
                .lock()
                .unwrap()
                .iter()
                .find(|(m, _)| *m == method)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| json!({ "error": { "code": -32601, "message": "Method not found" } }))
        };
        let mut envelope = json!({ "jsonrpc": "2.0", "id": req["id"].clone() });
        if let Some(err) = reply.get("error") {
            envelope["error"] = err.clone();
        } else {
            envelope["result"] = reply;
        }
        Json(envelope)
    }

    async fn serve(app: Router) -> RpcClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        RpcClient::new(format!("http://{addr}/"), Duration::from_secs(5))
    }

    async fn spawn(node: Arc<FakeNode>) -> RpcClient {
        serve(Router::new().route("/", post(handle)).with_state(node)).await
    }

    fn node_with(responses: Vec<(&'static str, Value)>) -> Arc<FakeNode> {
        Arc::new(FakeNode {
            responses: Mutex::new(responses),
            seen: Mutex::default(),
        })
    }

    fn signed_transfer(blockhash: Hash) -> Transaction {
        let payer = generate_keypair();
        let to = generate_keypair().pubkey();
        let ixs = transfer_instructions(&payer.pubkey(), &[(to, Lamports::new(1))]);
        let mut tx = unsigned_transaction(&payer.pubkey(), &ixs, blockhash);
        tx.sign(&[&payer], blockhash);
        tx
    }

    #[tokio::test]
    async fn balance_reads_context_value() {
        let node = node_with(vec![(
            "getBalance",
            json!({ "context": { "slot": 1 }, "value": 2_500_000_000u64 }),
        )]);
        let client = spawn(node.clone()).await;
        let address = WalletAddress::from_pubkey(&generate_keypair().pubkey());

        let balance = client
            .get_balance(&address, Commitment::Confirmed)
            .await
            .unwrap();
        assert_eq!(balance, Lamports::new(2_500_000_000));

        let calls = node.calls("getBalance");
        assert_eq!(calls[0]["jsonrpc"], "2.0");
        assert_eq!(calls[0]["params"][0], address.as_str());
        assert_eq!(calls[0]["params"][1]["commitment"], "confirmed");
    }

    #[tokio::test]
    async fn latest_blockhash_is_parsed() {
        let hash = Hash::new_from_array([9u8; 32]);
        let node = node_with(vec![(
            "getLatestBlockhash",
            json!({ "context": { "slot": 1 }, "value": {
                "blockhash": hash.to_string(),
                "lastValidBlockHeight": 150
            }}),
        )]);
        let client = spawn(node).await;
        let latest = client
            .get_latest_blockhash(Commitment::Finalized)
            .await
            .unwrap();
        assert_eq!(latest.blockhash, hash);
        assert_eq!(latest.last_valid_block_height, 150);
    }

    #[tokio::test]
    async fn submission_returns_the_transaction_signature() {
        let tx = signed_transfer(Hash::new_unique());
        let node = node_with(vec![("sendTransaction", json!(tx.signatures[0].to_string()))]);
        let client = spawn(node.clone()).await;

        let config = SendConfig {
            max_retries: Some(0),
            ..SendConfig::default()
        };
        let signature = client.send_transaction(&tx, config).await.unwrap();
        assert_eq!(signature, tx.signatures[0]);

        let calls = node.calls("sendTransaction");
        assert_eq!(calls[0]["params"][1]["encoding"], "base64");
        assert_eq!(calls[0]["params"][1]["skipPreflight"], false);
        assert_eq!(calls[0]["params"][1]["preflightCommitment"], "confirmed");
        assert_eq!(calls[0]["params"][1]["maxRetries"], 0);
    }

    #[tokio::test]
    async fn preflight_failure_maps_to_json_rpc_error() {
        let node = node_with(vec![(
            "sendTransaction",
            json!({ "error": {
                "code": -32002,
                "message": "Transaction simulation failed: insufficient funds"
            }}),
        )]);
        let client = spawn(node).await;

        let err = client
            .send_transaction(&signed_transfer(Hash::default()), SendConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_preflight_failure());
        assert!(err.is_definite_rejection());
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn gateway_status_is_http_error() {
        let app = Router::new().route("/", post(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let client = serve(app).await;
        let err = client.get_block_height(Commitment::Confirmed).await.unwrap_err();
        assert_eq!(err, RpcError::Http(503));
        assert!(!err.is_definite_rejection());
    }

    #[tokio::test]
    async fn confirmed_status_is_mapped() {
        let node = node_with(vec![(
            "getSignatureStatuses",
            json!({ "context": { "slot": 90 }, "value": [{
                "slot": 88,
                "confirmations": 4,
                "status": { "Ok": null },
                "err": null,
                "confirmationStatus": "confirmed"
            }]}),
        )]);
        let client = spawn(node).await;
        let status = client
            .get_signature_status(&Signature::from([1u8; 64]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.slot, 88);
        assert_eq!(status.reached(), Commitment::Confirmed);
        assert!(status.err.is_none());
    }

    #[tokio::test]
    async fn unseen_signature_is_none() {
        let node = node_with(vec![(
            "getSignatureStatuses",
            json!({ "context": { "slot": 1 }, "value": [null] }),
        )]);
        let client = spawn(node).await;
        let status = client
            .get_signature_status(&Signature::from([1u8; 64]))
            .await
            .unwrap();
        assert!(status.is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let client = RpcClient::new("http://127.0.0.1:1/", Duration::from_millis(500));
        let err = client.get_block_height(Commitment::Confirmed).await.unwrap_err();
        assert!(matches!(err, RpcError::Transport(_)));
    }
}
