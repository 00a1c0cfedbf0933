//! RPC error types.

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::RpcError as NodeError;
use thiserror::Error;

/// JSON-RPC error code for a failed preflight simulation.
pub const PREFLIGHT_FAILURE_CODE: i64 = -32002;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// No response: connection refused, reset, or timed out.
    #[error("request failed: {0}")]
    Transport(String),

    #[error("endpoint returned HTTP {0}")]
    Http(u16),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    /// The node answered but the body could not be used.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Refused locally before anything was sent.
    #[error("transaction rejected before submission: {0}")]
    Rejected(String),
}

impl RpcError {
    /// The node simulated the transaction and it failed (e.g. insufficient
    /// funds). Nothing was broadcast.
    pub fn is_preflight_failure(&self) -> bool {
        matches!(self, Self::JsonRpc { code, .. } if *code == PREFLIGHT_FAILURE_CODE)
    }

    /// Whether a failed `sendTransaction` definitely did not reach the
    /// cluster. Only an explicit node rejection or a local refusal qualifies;
    /// transport failures, gateway statuses and unreadable replies may all
    /// hide a transaction that was forwarded.
    pub fn is_definite_rejection(&self) -> bool {
        matches!(self, Self::JsonRpc { .. } | Self::Rejected(_))
    }
}

impl From<ClientError> for RpcError {
    fn from(err: ClientError) -> Self {
        match err.kind {
            ClientErrorKind::Io(e) => Self::Transport(e.to_string()),
            ClientErrorKind::Reqwest(e) => match e.status() {
                Some(status) => Self::Http(status.as_u16()),
                None if e.is_decode() => Self::InvalidResponse(e.to_string()),
                None => Self::Transport(e.to_string()),
            },
            ClientErrorKind::RpcError(NodeError::RpcResponseError { code, message, .. }) => {
                Self::JsonRpc { code, message }
            }
            ClientErrorKind::RpcError(other) => Self::InvalidResponse(other.to_string()),
            ClientErrorKind::SerdeJson(e) => Self::InvalidResponse(e.to_string()),
            ClientErrorKind::SigningError(e) => Self::Rejected(e.to_string()),
            ClientErrorKind::TransactionError(e) => Self::Rejected(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}
