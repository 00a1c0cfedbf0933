//! Signing capability.
//!
//! Executors take any `solana_sdk` [`Signer`]: a plain [`Keypair`] for
//! custodial secrets, or a [`KeystoreSigner`] that never keeps the seed in
//! memory between signatures.

use franchise_crypto::keypair_from_seed;
use franchise_store::KeystoreFile;
use franchise_types::WalletAddress;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use zeroize::Zeroizing;

pub use solana_sdk::signer::{Signer, SignerError};

use crate::keystore::decrypt_keystore;
use crate::SettlementError;

/// Wallet address of a signer.
pub trait SignerAddress {
    fn address(&self) -> WalletAddress;
}

impl<S: Signer + ?Sized> SignerAddress for S {
    fn address(&self) -> WalletAddress {
        WalletAddress::from_pubkey(&self.pubkey())
    }
}

/// Holds only the encrypted keystore. The seed is decrypted for each
/// signature and wiped immediately after.
pub struct KeystoreSigner {
    keystore: KeystoreFile,
    passphrase: Zeroizing<String>,
    public: Pubkey,
}

impl KeystoreSigner {
    /// Unlock once to check the passphrase and learn the public key.
    pub fn new(keystore: KeystoreFile, passphrase: impl Into<String>) -> Result<Self, SettlementError> {
        let passphrase = Zeroizing::new(passphrase.into());
        let public = unlock(&keystore, &passphrase)?.pubkey();
        Ok(Self {
            keystore,
            passphrase,
            public,
        })
    }
}

fn unlock(keystore: &KeystoreFile, passphrase: &str) -> Result<Keypair, SettlementError> {
    let seed = decrypt_keystore(keystore, passphrase)?;
    Ok(keypair_from_seed(&seed)?)
}

impl Signer for KeystoreSigner {
    fn try_pubkey(&self) -> Result<Pubkey, SignerError> {
        Ok(self.public)
    }

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        let keypair = unlock(&self.keystore, &self.passphrase)
            .map_err(|e| SignerError::Custom(e.to_string()))?;
        if keypair.pubkey() != self.public {
            return Err(SignerError::Custom("keystore changed since unlock".into()));
        }
        keypair.try_sign_message(message)
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
