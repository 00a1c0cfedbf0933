use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid secret key format: {0}")]
    InvalidSecretKey(String),
}
