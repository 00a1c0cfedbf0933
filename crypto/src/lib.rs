//! Custodial key handling.
//!
//! - Parsing of secret-key material (64-byte `seed || pubkey` arrays or bare
//!   32-byte seeds) into `solana_sdk` keypairs
//! - Seed extraction for the encrypted keystore
//!
//! Secret bytes only ever live in zeroizing buffers.

pub mod error;
pub mod keys;

pub use error::CryptoError;
pub use keys::{
    generate_keypair, keypair_from_secret_material, keypair_from_seed, secret_material_bytes,
    seed_of,
};
