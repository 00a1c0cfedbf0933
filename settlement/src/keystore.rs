//! Argon2id encrypted keystore for custodial Ed25519 secret keys.
//!
//! Encrypts a 32-byte seed with an operator passphrase:
//! 1. Argon2id derives a 32-byte encryption key from the passphrase + random salt
//! 2. AES-256-GCM encrypts the seed with a random nonce
//! 3. The result is a [`KeystoreFile`], stored in a wallet record or as JSON on disk
//!
//! Decryption reads the KDF parameters from the file, so keystores written
//! with cheaper parameters (tests, local validators) stay readable.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use franchise_store::{KdfParams, KeystoreCrypto, KeystoreFile};
use rand::RngCore;
use std::path::Path;
use zeroize::Zeroizing;

use crate::SettlementError;

/// Argon2id parameters: 64 MB memory, 3 iterations, 1 lane of parallelism.
const ARGON2_MEMORY_KIB: u32 = 65536;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

const SALT_LEN: usize = 32;
/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

const KEYSTORE_VERSION: u32 = 1;

impl From<aes_gcm::Error> for SettlementError {
    fn from(_: aes_gcm::Error) -> Self {
        SettlementError::Keystore("decryption failed: wrong passphrase or corrupted data".into())
    }
}

/// Production KDF cost.
pub fn default_kdf_params() -> KdfParams {
    KdfParams {
        memory: ARGON2_MEMORY_KIB,
        iterations: ARGON2_ITERATIONS,
        parallelism: ARGON2_PARALLELISM,
    }
}

/// Encrypt a 32-byte seed with the production KDF cost.
pub fn encrypt_keystore(seed: &[u8; 32], passphrase: &str) -> Result<KeystoreFile, SettlementError> {
    encrypt_keystore_with(seed, passphrase, default_kdf_params())
}

/// Encrypt a 32-byte seed with explicit Argon2id parameters.
pub fn encrypt_keystore_with(
    seed: &[u8; 32],
    passphrase: &str,
    kdf_params: KdfParams,
) -> Result<KeystoreFile, SettlementError> {
    let mut rng = rand::thread_rng();

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let derived_key = derive_key(passphrase, &salt, &kdf_params)?;
    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| SettlementError::Keystore(format!("AES key init failed: {e}")))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), &seed[..])
        .map_err(|_| SettlementError::Keystore("encryption failed".into()))?;

    Ok(KeystoreFile {
        version: KEYSTORE_VERSION,
        crypto: KeystoreCrypto {
            cipher: "aes-256-gcm".to_string(),
            kdf: "argon2id".to_string(),
            kdf_params,
            salt: hex::encode(salt),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
        },
    })
}

/// Decrypt a keystore, returning the seed in a buffer zeroized on drop.
pub fn decrypt_keystore(
    keystore: &KeystoreFile,
    passphrase: &str,
) -> Result<Zeroizing<[u8; 32]>, SettlementError> {
    if keystore.version != KEYSTORE_VERSION {
        return Err(SettlementError::Keystore(format!(
            "unsupported keystore version: {}",
            keystore.version
        )));
    }
    let crypto = &keystore.crypto;
    if crypto.cipher != "aes-256-gcm" || crypto.kdf != "argon2id" {
        return Err(SettlementError::Keystore(format!(
            "unsupported scheme: {}/{}",
            crypto.kdf, crypto.cipher
        )));
    }

    let decode = |field: &str, value: &str| {
        hex::decode(value).map_err(|e| SettlementError::Keystore(format!("invalid {field} hex: {e}")))
    };
    let salt = decode("salt", &crypto.salt)?;
    let nonce_bytes = decode("nonce", &crypto.nonce)?;
    let ciphertext = decode("ciphertext", &crypto.ciphertext)?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(SettlementError::Keystore(format!(
            "invalid nonce length: expected {NONCE_LEN}, got {}",
            nonce_bytes.len()
        )));
    }

    let derived_key = derive_key(passphrase, &salt, &crypto.kdf_params)?;
    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| SettlementError::Keystore(format!("AES key init failed: {e}")))?;
    let plaintext = Zeroizing::new(
        cipher.decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())?,
    );

    if plaintext.len() != 32 {
        return Err(SettlementError::Keystore(format!(
            "decrypted key has wrong length: expected 32, got {}",
            plaintext.len()
        )));
    }
    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&plaintext);
    Ok(seed)
}

pub fn save_keystore(keystore: &KeystoreFile, path: &Path) -> Result<(), SettlementError> {
    let json = serde_json::to_string_pretty(keystore)
        .map_err(|e| SettlementError::Keystore(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| SettlementError::Keystore(format!("failed to write {}: {e}", path.display())))
}

pub fn load_keystore(path: &Path) -> Result<KeystoreFile, SettlementError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| SettlementError::Keystore(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&json)
        .map_err(|e| SettlementError::Keystore(format!("invalid keystore JSON: {e}")))
}

fn derive_key(
    passphrase: &str,
    salt: &[u8],
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, SettlementError> {
    let params = Params::new(kdf.memory, kdf.iterations, kdf.parallelism, Some(ARGON2_OUTPUT_LEN))
        .map_err(|e| SettlementError::Keystore(format!("Argon2 params error: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut output[..])
        .map_err(|e| SettlementError::Keystore(format!("Argon2 hashing failed: {e}")))?;
    Ok(output)
}

/// Cheap parameters for unit and integration tests.
#[cfg(test)]
pub(crate) fn test_kdf_params() -> KdfParams {
    KdfParams {
        memory: 1024,
        iterations: 1,
        parallelism: 1,
    }
}
