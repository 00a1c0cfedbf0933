use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction is {size} bytes, the packet limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("failed to serialize transaction: {0}")]
    Encode(String),

    #[error("unsupported instruction: {0}")]
    Unsupported(String),
}
