//! Serialized transaction size.

use solana_sdk::transaction::Transaction;

use crate::TransactionError;

pub use solana_sdk::packet::PACKET_DATA_SIZE;

/// Bytes the transaction occupies on the wire.
pub fn wire_size(transaction: &Transaction) -> Result<usize, TransactionError> {
    bincode::serialized_size(transaction)
        .map(|size| size as usize)
        .map_err(|e| TransactionError::Encode(e.to_string()))
}

/// Reject transactions that cannot fit in one packet. Placeholder signatures
/// have the same width as real ones, so this works before signing.
pub fn check_size(transaction: &Transaction) -> Result<usize, TransactionError> {
    let size = wire_size(transaction)?;
    if size > PACKET_DATA_SIZE {
        return Err(TransactionError::TooLarge {
            size,
            max: PACKET_DATA_SIZE,
        });
    }
    Ok(size)
}
