use super::associated_token_account::create_instruction_if_needed;
use crate::{get_decimals, prelude::*, utils::ui_amount_to_amount};
use spl_associated_token_account::get_associated_token_address;
use spl_token::instruction::mint_to_checked;

const NAME: &str = "mint_to";

inventory::submit!(CommandDescription::new(
    NAME,
    "mint tokens into an associated token account"
));

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    /// Owner of the receiving token account, defaults to the wallet.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub recipient: Option<Pubkey>,
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
    pub token_account: Pubkey,
}

/// `ata_owner` is the program owning the recipient's associated token
/// account, `None` if it doesn't exist.
pub fn mint_to_instructions(
    payer: &Pubkey,
    recipient: &Pubkey,
    mint: &Pubkey,
    ui_amount: Decimal,
    decimals: u8,
    ata_owner: Option<Pubkey>,
) -> crate::Result<(Pubkey, Vec<Instruction>)> {
    let amount = ui_amount_to_amount(ui_amount, decimals)?;
    let token_account = get_associated_token_address(recipient, mint);

    let mut instructions = Vec::new();
    instructions.extend(create_instruction_if_needed(
        payer,
        recipient,
        mint,
        &token_account,
        ata_owner,
    )?);
    instructions.push(mint_to_checked(
        &spl_token::id(),
        mint,
        &token_account,
        payer,
        &[],
        amount,
        decimals,
    )?);
    Ok((token_account, instructions))
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let payer = ctx.payer.pubkey();
    let recipient = input.recipient.unwrap_or(payer);
    let decimals = match input.decimals {
        Some(d) => d,
        None => get_decimals(&ctx.solana_client, input.mint).await?,
    };
    let ata_owner = ctx
        .solana_client
        .get_account_with_commitment(
            &get_associated_token_address(&recipient, &input.mint),
            ctx.solana_client.commitment(),
        )
        .await
        .map_err(crate::Error::from)?
        .value
        .map(|a| a.owner);

    let (token_account, instructions) = mint_to_instructions(
        &payer,
        &recipient,
        &input.mint,
        input.amount,
        decimals,
        ata_owner,
    )?;

    let mut ins = ctx.instructions();
    ins.instructions = instructions;
    let signature = ctx.execute(ins).await?;
    tracing::info!("minted {} to {}", input.amount, token_account);

    Ok(Output {
        signature,
        token_account,
    })
}
