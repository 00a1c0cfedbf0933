//! Funding round state, owned by the platform and read by the payout gate.

use franchise_types::{Lamports, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::StoreError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRound {
    pub id: String,
    pub franchise: String,
    pub escrow_wallet: WalletAddress,
    /// Working-capital wallet receiving the payout, once the franchise has one.
    #[serde(default)]
    pub franchise_wallet: Option<WalletAddress>,
    pub target: Lamports,
    pub raised: Lamports,
    #[serde(default)]
    pub contributor_count: u32,
}

impl FundingRound {
    pub fn is_complete(&self) -> bool {
        !self.target.is_zero() && self.raised >= self.target
    }
}

/// Read access to funding rounds. The settlement core never writes them.
pub trait FundingRoundStore {
    fn get_round(&self, id: &str) -> Result<Option<FundingRound>, StoreError>;
}
