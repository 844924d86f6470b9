use crate::prelude::*;
use solana_sdk::{program_pack::Pack, system_instruction};
use spl_token::state::Mint;

const NAME: &str = "create_mint";

inventory::submit!(CommandDescription::new(NAME, "create an SPL token mint"));

fn default_decimals() -> u8 {
    9
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Defaults to the wallet.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub mint_authority: Option<Pubkey>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub freeze_authority: Option<Pubkey>,
    #[serde(default)]
    pub memo: String,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
}

pub fn create_mint_instructions(
    fee_payer: &Pubkey,
    mint: &Pubkey,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
    decimals: u8,
    rent: u64,
) -> crate::Result<Vec<Instruction>> {
    Ok([
        system_instruction::create_account(
            fee_payer,
            mint,
            rent,
            Mint::LEN as u64,
            &spl_token::id(),
        ),
        spl_token::instruction::initialize_mint2(
            &spl_token::id(),
            mint,
            mint_authority,
            freeze_authority,
            decimals,
        )?,
    ]
    .into())
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let mint = Keypair::new();
    let rent = ctx
        .solana_client
        .get_minimum_balance_for_rent_exemption(Mint::LEN)
        .await
        .map_err(crate::Error::from)?;

    let mut ins = ctx.instructions();
    ins.push_signer(&mint);
    ins.instructions = create_mint_instructions(
        &ctx.payer.pubkey(),
        &mint.pubkey(),
        &input.mint_authority.unwrap_or_else(|| ctx.payer.pubkey()),
        input.freeze_authority.as_ref(),
        input.decimals,
        rent,
    )?;
    if !input.memo.is_empty() {
        ins.instructions.push(spl_memo::build_memo(
            input.memo.as_bytes(),
            &[&ctx.payer.pubkey()],
        ));
    }

    let signature = ctx.execute(ins).await?;
    tracing::info!("created mint {}", mint.pubkey());

    Ok(Output {
        signature,
        mint: mint.pubkey(),
    })
}
