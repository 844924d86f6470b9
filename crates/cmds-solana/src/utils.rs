use borsh::{BorshDeserialize, BorshSerialize};
use rust_decimal::{
    prelude::{MathematicalOps, ToPrimitive},
    Decimal,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_program::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
};

pub fn sol_to_lamports(amount: Decimal) -> crate::Result<u64> {
    if amount < Decimal::ZERO {
        return Err(crate::Error::NegativeAmount);
    }
    amount
        .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
        .and_then(|d| d.floor().to_u64())
        .ok_or(crate::Error::AmountOverflow)
}

/// Convert the UI representation of a token amount (using the decimals field defined in its mint)
/// to the raw amount.
pub fn ui_amount_to_amount(ui_amount: Decimal, decimals: u8) -> crate::Result<u64> {
    if ui_amount < Decimal::ZERO {
        return Err(crate::Error::NegativeAmount);
    }
    Decimal::TEN
        .checked_powu(decimals as u64)
        .and_then(|scale| ui_amount.checked_mul(scale))
        .and_then(|d| d.floor().to_u64())
        .ok_or(crate::Error::AmountOverflow)
}

fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let preimage = format!("{}:{}", namespace, name);
    let mut sighash = [0u8; 8];
    sighash.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
    sighash
}

/// First 8 bytes of an Anchor instruction's data.
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    sighash("global", name)
}

/// First 8 bytes of an Anchor account's data, `name` is the account struct name.
pub fn account_discriminator(name: &str) -> [u8; 8] {
    sighash("account", name)
}

/// Anchor instruction data is the discriminator followed by the borsh encoded arguments.
pub fn build_anchor_instruction<A: BorshSerialize>(
    program_id: Pubkey,
    name: &str,
    accounts: Vec<AccountMeta>,
    args: &A,
) -> crate::Result<Instruction> {
    let mut data = anchor_discriminator(name).to_vec();
    args.serialize(&mut data)?;
    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

/// Decode an Anchor account after checking its discriminator.
pub fn decode_anchor_account<T: BorshDeserialize>(
    address: &Pubkey,
    name: &'static str,
    data: &[u8],
) -> crate::Result<T> {
    if data.len() < 8 || data[..8] != account_discriminator(name) {
        return Err(crate::Error::AccountDiscriminatorMismatch(*address, name));
    }
    let mut rest = &data[8..];
    Ok(T::deserialize(&mut rest)?)
}

pub async fn fetch_anchor_account<T: BorshDeserialize>(
    client: &RpcClient,
    address: &Pubkey,
    name: &'static str,
) -> crate::Result<T> {
    let account = client
        .get_account_with_commitment(address, client.commitment())
        .await?
        .value
        .ok_or(crate::Error::AccountNotFound(*address))?;
    decode_anchor_account(address, name, &account.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sol_to_lamports() {
        assert_eq!(
            sol_to_lamports(Decimal::from_str("0.1").unwrap()).unwrap(),
            100_000_000
        );
        assert_eq!(
            sol_to_lamports(Decimal::from_str("0.05").unwrap()).unwrap(),
            50_000_000
        );
        assert!(matches!(
            sol_to_lamports(Decimal::from_str("-1").unwrap()),
            Err(crate::Error::NegativeAmount)
        ));
    }

    #[test]
    fn test_ui_amount_to_amount() {
        assert_eq!(
            ui_amount_to_amount(Decimal::from(1000), 6).unwrap(),
            1_000_000_000
        );
        assert_eq!(
            ui_amount_to_amount(Decimal::from_str("1.5").unwrap(), 9).unwrap(),
            1_500_000_000
        );
        assert_eq!(
            ui_amount_to_amount(Decimal::from_str("0.0000001").unwrap(), 6).unwrap(),
            0
        );
        assert!(matches!(
            ui_amount_to_amount(Decimal::MAX, 9),
            Err(crate::Error::AmountOverflow)
        ));
    }

    #[test]
    fn test_decimals_out_of_range() {
        // mints may declare any u8 decimals, 10^29 no longer fits a Decimal
        assert_eq!(ui_amount_to_amount(Decimal::ZERO, 28).unwrap(), 0);
        for decimals in [29, 30, u8::MAX] {
            assert!(matches!(
                ui_amount_to_amount(Decimal::ONE, decimals),
                Err(crate::Error::AmountOverflow)
            ));
        }
    }

    #[test]
    fn test_anchor_discriminator() {
        // sha256("global:initialize")[..8]
        assert_eq!(
            anchor_discriminator("initialize"),
            [175, 175, 109, 31, 13, 152, 155, 237]
        );
        assert_ne!(
            anchor_discriminator("deposit"),
            anchor_discriminator("deposit_spl")
        );
    }

    #[test]
    fn test_build_anchor_instruction() {
        let program_id = Pubkey::new_unique();
        let ix = build_anchor_instruction(program_id, "deposit", vec![], &1_000_000u64).unwrap();
        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.data.len(), 16);
        assert_eq!(ix.data[..8], anchor_discriminator("deposit"));
        assert_eq!(ix.data[8..], 1_000_000u64.to_le_bytes());

        let ix = build_anchor_instruction(program_id, "take", vec![], &()).unwrap();
        assert_eq!(ix.data, anchor_discriminator("take"));
    }

    #[derive(BorshSerialize, BorshDeserialize, Debug, PartialEq)]
    struct Counter {
        count: u64,
    }

    #[test]
    fn test_decode_anchor_account() {
        let address = Pubkey::new_unique();
        let mut data = account_discriminator("Counter").to_vec();
        data.extend(borsh::to_vec(&Counter { count: 7 }).unwrap());
        // allocated space may be larger than the struct
        data.extend([0u8; 16]);

        let counter: Counter = decode_anchor_account(&address, "Counter", &data).unwrap();
        assert_eq!(counter, Counter { count: 7 });

        assert!(matches!(
            decode_anchor_account::<Counter>(&address, "Other", &data),
            Err(crate::Error::AccountDiscriminatorMismatch(pk, "Other")) if pk == address
        ));
        assert!(decode_anchor_account::<Counter>(&address, "Counter", &data[..4]).is_err());
    }
}
