use crate::prelude::*;
use solana_program::system_program;
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};

/// Associated token account of `owner` for `mint`, with the instruction to
/// create it when it doesn't exist yet.
pub async fn get_or_create_associated_token_account(
    client: &RpcClient,
    fee_payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> crate::Result<(Pubkey, Option<Instruction>)> {
    let address = get_associated_token_address(owner, mint);
    let account = client
        .get_account_with_commitment(&address, client.commitment())
        .await?
        .value;
    let instruction = create_instruction_if_needed(
        fee_payer,
        owner,
        mint,
        &address,
        account.as_ref().map(|a| a.owner),
    )?;
    Ok((address, instruction))
}

/// `account_owner` is the program owning `address`, `None` if it doesn't exist.
pub fn create_instruction_if_needed(
    fee_payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    address: &Pubkey,
    account_owner: Option<Pubkey>,
) -> crate::Result<Option<Instruction>> {
    match account_owner {
        Some(x) if x == spl_token::id() => Ok(None),
        Some(x) if x != system_program::id() => {
            Err(crate::Error::UnsupportedRecipientAddress(address.to_string()))
        }
        _ => {
            tracing::info!("creating associated token account {}", address);
            Ok(Some(create_associated_token_account_idempotent(
                fee_payer,
                owner,
                mint,
                &spl_token::id(),
            )))
        }
    }
}
