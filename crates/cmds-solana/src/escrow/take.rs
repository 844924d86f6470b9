use super::{take_instruction, Escrow, ESCROW_ACCOUNT};
use crate::{prelude::*, utils::fetch_anchor_account};

const NAME: &str = "escrow_take";

inventory::submit!(CommandDescription::new(
    NAME,
    "pay the asked taker tokens and receive the escrowed maker tokens"
));

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub escrow: Pubkey,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub maker: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub received_token: Pubkey,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let escrow: Escrow =
        fetch_anchor_account(&ctx.solana_client, &input.escrow, ESCROW_ACCOUNT).await?;
    tracing::debug!("{:?}", escrow);

    let mut ins = ctx.instructions();
    ins.instructions
        .push(take_instruction(&ctx.payer.pubkey(), &input.escrow, &escrow)?);
    let signature = ctx.execute(ins).await?;
    tracing::info!("took escrow {}", input.escrow);

    Ok(Output {
        signature,
        maker: escrow.maker,
        received_token: escrow.maker_token,
    })
}
