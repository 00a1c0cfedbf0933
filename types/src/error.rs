//! Parsing and conversion errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount overflows the lamport range")]
    AmountOverflow,

    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),
}
