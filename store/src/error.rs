use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No wallet, transfer-log entry or round under this key.
    #[error("no record for {0}")]
    NotFound(String),

    #[error("store I/O failed: {0}")]
    Backend(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("malformed store document: {0}")]
    Serialization(String),
}
