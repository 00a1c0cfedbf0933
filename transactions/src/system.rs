//! System-program native transfers.

use franchise_types::Lamports;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction::{self, SystemInstruction};
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;

use crate::TransactionError;

/// One transfer instruction per leg, all drawing from `from`.
pub fn transfer_instructions(from: &Pubkey, legs: &[(Pubkey, Lamports)]) -> Vec<Instruction> {
    let legs: Vec<(Pubkey, u64)> = legs.iter().map(|(to, l)| (*to, l.raw())).collect();
    system_instruction::transfer_many(from, &legs)
}

/// Unsigned transaction with `payer` as fee payer and sole signer slot.
pub fn unsigned_transaction(payer: &Pubkey, instructions: &[Instruction], blockhash: Hash) -> Transaction {
    Transaction::new_unsigned(Message::new_with_blockhash(instructions, Some(payer), &blockhash))
}

/// A decoded system transfer, as found in a compiled message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemTransfer {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: Lamports,
}

/// Decode every instruction of `message` as a system transfer. Any other
/// instruction is an error.
pub fn system_transfers(message: &Message) -> Result<Vec<SystemTransfer>, TransactionError> {
    let key = |index: u8| message.account_keys.get(index as usize).copied();
    message
        .instructions
        .iter()
        .map(|ix| {
            let program = key(ix.program_id_index)
                .ok_or_else(|| TransactionError::Unsupported("program index out of range".into()))?;
            if !system_program::check_id(&program) {
                return Err(TransactionError::Unsupported(format!("program {program}")));
            }
            let lamports = match bincode::deserialize::<SystemInstruction>(&ix.data) {
                Ok(SystemInstruction::Transfer { lamports }) => lamports,
                _ => return Err(TransactionError::Unsupported("not a transfer".into())),
            };
            let account = |pos: usize| ix.accounts.get(pos).and_then(|&i| key(i));
            match (account(0), account(1)) {
                (Some(from), Some(to)) => Ok(SystemTransfer {
                    from,
                    to,
                    lamports: Lamports::new(lamports),
                }),
                _ => Err(TransactionError::Unsupported("transfer without accounts".into())),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use franchise_crypto::keypair_from_seed;
    use solana_sdk::signer::Signer;

    #[test]
    fn legs_compile_to_transfers_from_the_payer() {
        let payer = keypair_from_seed(&[1u8; 32]).unwrap().pubkey();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let ixs = transfer_instructions(&payer, &[(a, Lamports::new(5)), (b, Lamports::new(7))]);
        let tx = unsigned_transaction(&payer, &ixs, Hash::new_unique());

        assert_eq!(tx.message.account_keys[0], payer);
        assert_eq!(tx.message.header.num_required_signatures, 1);
        assert_eq!(tx.signatures.len(), 1);
        assert_eq!(
            system_transfers(&tx.message).unwrap(),
            vec![
                SystemTransfer { from: payer, to: a, lamports: Lamports::new(5) },
                SystemTransfer { from: payer, to: b, lamports: Lamports::new(7) },
            ]
        );
    }

    #[test]
    fn non_system_instructions_are_rejected() {
        let payer = Pubkey::new_unique();
        let foreign = Instruction::new_with_bytes(Pubkey::new_unique(), &[1, 2, 3], vec![]);
        let tx = unsigned_transaction(&payer, &[foreign], Hash::default());
        assert!(matches!(
            system_transfers(&tx.message),
            Err(TransactionError::Unsupported(_))
        ));
    }

    #[test]
    fn other_system_instructions_are_rejected() {
        let payer = Pubkey::new_unique();
        let assign = system_instruction::assign(&payer, &Pubkey::new_unique());
        let tx = unsigned_transaction(&payer, &[assign], Hash::default());
        assert!(system_transfers(&tx.message).is_err());
    }
}
