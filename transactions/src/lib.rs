//! Native-SOL transfer transactions.
//!
//! - **system**: transfer instructions and the unsigned transaction around them,
//!   plus decoding of compiled transfers (used by the in-memory test cluster)
//! - **packet**: the serialized-size check against Solana's packet limit

pub mod error;
pub mod packet;
pub mod system;

pub use error::TransactionError;
pub use packet::{check_size, wire_size, PACKET_DATA_SIZE};
pub use system::{system_transfers, transfer_instructions, unsigned_transaction, SystemTransfer};
