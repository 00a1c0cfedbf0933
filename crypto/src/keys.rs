//! Secret-key parsing into Solana keypairs.

use serde::de::{self, SeqAccess, Visitor};
use serde::Deserializer as _;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::keypair;
use solana_sdk::signer::Signer;
use std::fmt;
use zeroize::Zeroizing;

use crate::CryptoError;

const SEED_LEN: usize = 32;
const KEYPAIR_LEN: usize = 64;

/// Generate a fresh keypair from the OS random source.
pub fn generate_keypair() -> Keypair {
    Keypair::new()
}

/// Deterministic keypair for a 32-byte Ed25519 seed.
pub fn keypair_from_seed(seed: &[u8; SEED_LEN]) -> Result<Keypair, CryptoError> {
    keypair::keypair_from_seed(seed).map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))
}

/// The 32-byte seed behind a keypair, for encryption at rest.
pub fn seed_of(keypair: &Keypair) -> Zeroizing<[u8; SEED_LEN]> {
    let bytes = Zeroizing::new(keypair.to_bytes());
    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    seed.copy_from_slice(&bytes[..SEED_LEN]);
    seed
}

/// Collects a JSON byte array straight into a zeroizing buffer. The buffer
/// never reallocates, so no stray copy of the secret is left behind, and a
/// parse error drops (and wipes) whatever was read so far.
struct SecretBytes;

impl<'de> Visitor<'de> for SecretBytes {
    type Value = Zeroizing<Vec<u8>>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an array of at most {KEYPAIR_LEN} bytes")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(KEYPAIR_LEN));
        while let Some(byte) = seq.next_element::<u8>()? {
            if bytes.len() == KEYPAIR_LEN {
                return Err(de::Error::invalid_length(KEYPAIR_LEN + 1, &self));
            }
            bytes.push(byte);
        }
        Ok(bytes)
    }
}

/// Decode secret-key material (a JSON byte array, the Solana CLI keypair
/// file format) into raw bytes. The returned buffer is zeroized on drop.
pub fn secret_material_bytes(material: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let trimmed = material.trim();
    if trimmed.is_empty() {
        return Err(CryptoError::InvalidSecretKey("empty secret key".into()));
    }
    let invalid = |_| CryptoError::InvalidSecretKey("expected an array of bytes".into());
    let mut deserializer = serde_json::Deserializer::from_str(trimmed);
    let bytes = (&mut deserializer).deserialize_seq(SecretBytes).map_err(invalid)?;
    deserializer.end().map_err(invalid)?;
    Ok(bytes)
}

/// Parse custodial secret-key material into a keypair.
///
/// 64-byte material is `seed || public key`; the embedded public key must be
/// the one derived from the seed. 32-byte material is a bare seed.
pub fn keypair_from_secret_material(material: &str) -> Result<Keypair, CryptoError> {
    let bytes = secret_material_bytes(material)?;
    if bytes.len() != KEYPAIR_LEN && bytes.len() != SEED_LEN {
        return Err(CryptoError::InvalidSecretKey(format!(
            "expected {KEYPAIR_LEN} or {SEED_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    seed.copy_from_slice(&bytes[..SEED_LEN]);
    let keypair = keypair_from_seed(&seed)?;
    if bytes.len() == KEYPAIR_LEN && keypair.pubkey().to_bytes()[..] != bytes[SEED_LEN..] {
        return Err(CryptoError::InvalidSecretKey(
            "embedded public key does not match the seed".into(),
        ));
    }
    Ok(keypair)
}
