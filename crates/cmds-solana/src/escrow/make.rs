use super::{find_escrow, find_vault, make_instruction, MakeArgs};
use crate::{get_decimals, prelude::*, utils::ui_amount_to_amount};

const NAME: &str = "escrow_make";

inventory::submit!(CommandDescription::new(
    NAME,
    "lock maker tokens in an escrow, asking for taker tokens in exchange"
));

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub maker_token: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub taker_token: Pubkey,
    /// Distinguishes escrows of the same maker.
    pub seed: u64,
    /// Amount of `maker_token` locked, in UI units.
    pub deposit_amount: Decimal,
    /// Amount of `taker_token` asked for, in UI units.
    pub offer_amount: Decimal,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub escrow: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub vault: Pubkey,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let maker = ctx.payer.pubkey();
    let deposit_amount = ui_amount_to_amount(
        input.deposit_amount,
        get_decimals(&ctx.solana_client, input.maker_token).await?,
    )?;
    let offer_amount = ui_amount_to_amount(
        input.offer_amount,
        get_decimals(&ctx.solana_client, input.taker_token).await?,
    )?;

    let mut ins = ctx.instructions();
    ins.instructions.push(make_instruction(
        &maker,
        &input.maker_token,
        &input.taker_token,
        MakeArgs {
            seed: input.seed,
            deposit_amount,
            offer_amount,
        },
    )?);
    let signature = ctx.execute(ins).await?;

    let (escrow, _) = find_escrow(&maker, input.seed);
    let (vault, _) = find_vault(&escrow);
    tracing::info!("created escrow {} with seed {}", escrow, input.seed);

    Ok(Output {
        signature,
        escrow,
        vault,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input() {
        let input: Input = serde_json::from_value(serde_json::json!({
            "maker_token": Pubkey::new_unique().to_string(),
            "taker_token": Pubkey::new_unique().to_string(),
            "seed": 1,
            "deposit_amount": "10",
            "offer_amount": "0.5",
        }))
        .unwrap();
        assert_eq!(input.seed, 1);
        assert_eq!(ui_amount_to_amount(input.offer_amount, 9).unwrap(), 500_000_000);
    }
}
