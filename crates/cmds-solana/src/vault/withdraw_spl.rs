use super::{spl_instruction, VaultAccounts};
use crate::{
    get_decimals, prelude::*, spl::get_or_create_associated_token_account,
    utils::ui_amount_to_amount,
};

const NAME: &str = "vault_withdraw_spl";

inventory::submit!(CommandDescription::new(
    NAME,
    "withdraw SPL tokens from a vault to the wallet"
));

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub vault_state: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    /// Amount in UI units.
    pub amount: Decimal,
    pub decimals: Option<u8>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub vault_ata: Pubkey,
    pub amount: u64,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let owner = ctx.payer.pubkey();
    let decimals = match input.decimals {
        Some(d) => d,
        None => get_decimals(&ctx.solana_client, input.mint).await?,
    };
    let amount = ui_amount_to_amount(input.amount, decimals)?;
    let accounts = VaultAccounts::new(input.vault_state);

    let mut ins = ctx.instructions();
    let (_, create_ata) =
        get_or_create_associated_token_account(&ctx.solana_client, &owner, &owner, &input.mint)
            .await?;
    ins.instructions.extend(create_ata);
    ins.instructions.push(spl_instruction(
        "withdraw_spl",
        &owner,
        &accounts,
        &input.mint,
        amount,
    )?);
    let signature = ctx.execute(ins).await?;

    let vault_ata = accounts.vault_ata(&input.mint);
    tracing::info!("withdrew {} of {}, vault ata {}", amount, input.mint, vault_ata);

    Ok(Output {
        signature,
        vault_ata,
        amount,
    })
}
