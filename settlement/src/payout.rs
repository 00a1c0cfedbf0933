//! Explicit approval step between a completed funding round and its payout.
//!
//! Nothing pays out automatically: an operator asks the [`PayoutGate`] for a
//! [`PayoutAuthorization`], and `EscrowFunder::pay_out` re-checks it against
//! the round before moving funds. Each round pays out at most once: the
//! payout is logged under [`PayoutAuthorization::idempotency_key`].

use franchise_store::{FundingRound, FundingRoundStore, TransferLogStore};
use franchise_types::{Lamports, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::SettlementError;

/// Approval to move a round's escrow into its franchise wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutAuthorization {
    pub round_id: String,
    pub escrow_wallet: WalletAddress,
    pub franchise_wallet: WalletAddress,
    pub amount: Lamports,
    pub approved_by: String,
    pub approved_at: Timestamp,
}

pub struct PayoutGate<'a, F> {
    rounds: &'a F,
}

impl<'a, F: FundingRoundStore + TransferLogStore> PayoutGate<'a, F> {
    pub fn new(rounds: &'a F) -> Self {
        Self { rounds }
    }

    /// Approve paying out the full raised amount of a completed round.
    pub fn authorize(
        &self,
        round_id: &str,
        approver: &str,
    ) -> Result<PayoutAuthorization, SettlementError> {
        let approver = approver.trim();
        if approver.is_empty() {
            return Err(SettlementError::Unauthorized("approver is required".into()));
        }
        let round = load_round(self.rounds, round_id)?;
        let franchise_wallet = payable_wallet(&round)?;
        if let Some(previous) = self.rounds.get_entry(&payout_key(&round.id))? {
            let reason = match previous.result {
                Some(result) if result.success => format!(
                    "round {} was already paid out in {}",
                    round.id,
                    result.signature.map(|s| s.to_string()).unwrap_or_default()
                ),
                _ => format!(
                    "round {} has an earlier payout attempt; reconcile and release it first",
                    round.id
                ),
            };
            return Err(SettlementError::Unauthorized(reason));
        }

        tracing::info!(
            round = %round.id,
            franchise = %round.franchise,
            amount = %round.raised,
            approved_by = approver,
            "payout authorized"
        );
        Ok(PayoutAuthorization {
            round_id: round.id,
            escrow_wallet: round.escrow_wallet,
            franchise_wallet,
            amount: round.raised,
            approved_by: approver.to_string(),
            approved_at: Timestamp::now(),
        })
    }
}

fn payout_key(round_id: &str) -> String {
    format!("payout:{round_id}")
}

impl PayoutAuthorization {
    /// Transfer-log key shared by every authorization for this round.
    pub fn idempotency_key(&self) -> String {
        payout_key(&self.round_id)
    }

    /// Check the authorization still matches the round and the signing wallet.
    pub fn verify<F: FundingRoundStore>(
        &self,
        rounds: &F,
        signer: &WalletAddress,
    ) -> Result<(), SettlementError> {
        let round = load_round(rounds, &self.round_id)?;
        let franchise_wallet = payable_wallet(&round)?;
        if franchise_wallet != self.franchise_wallet {
            return Err(SettlementError::Unauthorized(
                "franchise wallet changed since approval".into(),
            ));
        }
        if round.escrow_wallet != self.escrow_wallet || *signer != self.escrow_wallet {
            return Err(SettlementError::Unauthorized(
                "signer is not the round's escrow wallet".into(),
            ));
        }
        if self.amount.is_zero() || self.amount > round.raised {
            return Err(SettlementError::Unauthorized(format!(
                "authorized {} exceeds raised {}",
                self.amount, round.raised
            )));
        }
        Ok(())
    }
}

fn load_round<F: FundingRoundStore>(rounds: &F, id: &str) -> Result<FundingRound, SettlementError> {
    rounds
        .get_round(id)?
        .ok_or_else(|| SettlementError::Unauthorized(format!("unknown funding round {id}")))
}

fn payable_wallet(round: &FundingRound) -> Result<WalletAddress, SettlementError> {
    if !round.is_complete() {
        return Err(SettlementError::Unauthorized(format!(
            "round {} has raised {} of {}",
            round.id, round.raised, round.target
        )));
    }
    round.franchise_wallet.clone().ok_or_else(|| {
        SettlementError::Unauthorized(format!("round {} has no franchise wallet", round.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use franchise_nullables::NullStore;
    use franchise_store::TransferLogEntry;
    use franchise_types::{Network, TransferResult};
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Signature;

    fn addr(seed: u8) -> WalletAddress {
        WalletAddress::from_pubkey(&Pubkey::new_from_array([seed; 32]))
    }

    fn round(raised: u64, franchise_wallet: Option<WalletAddress>) -> FundingRound {
        FundingRound {
            id: "round-1".into(),
            franchise: "Burger Barn".into(),
            escrow_wallet: addr(1),
            franchise_wallet,
            target: Lamports::new(100),
            raised: Lamports::new(raised),
            contributor_count: 3,
        }
    }

    #[test]
    fn complete_round_is_authorized_for_raised_amount() {
        let store = NullStore::new();
        store.insert_round(round(120, Some(addr(2))));
        let auth = PayoutGate::new(&store).authorize("round-1", "ops@example.com").unwrap();
        assert_eq!(auth.amount, Lamports::new(120));
        assert_eq!(auth.franchise_wallet, addr(2));
        assert!(auth.verify(&store, &addr(1)).is_ok());
    }

    #[test]
    fn incomplete_round_is_refused() {
        let store = NullStore::new();
        store.insert_round(round(99, Some(addr(2))));
        let err = PayoutGate::new(&store).authorize("round-1", "ops").unwrap_err();
        assert!(err.to_string().contains("raised"));
    }

    #[test]
    fn round_without_franchise_wallet_is_refused() {
        let store = NullStore::new();
        store.insert_round(round(100, None));
        assert!(PayoutGate::new(&store).authorize("round-1", "ops").is_err());
    }

    #[test]
    fn blank_approver_and_unknown_round_are_refused() {
        let store = NullStore::new();
        store.insert_round(round(100, Some(addr(2))));
        let gate = PayoutGate::new(&store);
        assert!(gate.authorize("round-1", "  ").is_err());
        assert!(gate.authorize("round-9", "ops").is_err());
    }

    #[test]
    fn tampered_authorization_fails_verification() {
        let store = NullStore::new();
        store.insert_round(round(100, Some(addr(2))));
        let auth = PayoutGate::new(&store).authorize("round-1", "ops").unwrap();

        let redirected = PayoutAuthorization {
            franchise_wallet: addr(7),
            ..auth.clone()
        };
        assert!(redirected.verify(&store, &addr(1)).is_err());

        let inflated = PayoutAuthorization {
            amount: Lamports::new(1_000),
            ..auth.clone()
        };
        assert!(inflated.verify(&store, &addr(1)).is_err());

        assert!(auth.verify(&store, &addr(3)).is_err());
    }

    #[test]
    fn paid_round_cannot_be_authorized_again() {
        let store = NullStore::new();
        store.insert_round(round(100, Some(addr(2))));
        let auth = PayoutGate::new(&store).authorize("round-1", "ops").unwrap();
        assert_eq!(auth.idempotency_key(), "payout:round-1");

        let entry = TransferLogEntry {
            idempotency_key: auth.idempotency_key(),
            source: addr(1),
            destinations: vec![addr(2)],
            total: auth.amount,
            description: "payout".into(),
            result: Some(TransferResult::confirmed(Signature::from([3u8; 64]), Network::Devnet)),
            created_at: Timestamp::now(),
        };
        assert!(store.reserve(&entry).unwrap());

        let err = PayoutGate::new(&store).authorize("round-1", "ops").unwrap_err();
        assert!(err.to_string().contains("already paid out"));
    }
}
