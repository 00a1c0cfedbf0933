//! Wallet addresses: base58-encoded 32-byte Ed25519 public keys.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A validated wallet address.
///
/// Construction always goes through [`WalletAddress::parse`] or
/// [`WalletAddress::from_pubkey`], so every value decodes to a [`Pubkey`].
/// The text form is kept because stores and records key on it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and validate a base58 address string.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let raw = raw.trim();
        let key = Pubkey::from_str(raw)
            .map_err(|e| TypesError::InvalidAddress(format!("{raw}: {e}")))?;
        Ok(Self::from_pubkey(&key))
    }

    pub fn from_pubkey(key: &Pubkey) -> Self {
        Self(key.to_string())
    }

    pub fn pubkey(&self) -> Pubkey {
        // Validated at construction.
        Pubkey::from_str(&self.0).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<WalletAddress> for String {
    fn from(a: WalletAddress) -> Self {
        a.0
    }
}

impl From<Pubkey> for WalletAddress {
    fn from(key: Pubkey) -> Self {
        Self::from_pubkey(&key)
    }
}
