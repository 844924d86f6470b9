use super::{spl_instruction, VaultAccounts};
use crate::{get_decimals, prelude::*, utils::ui_amount_to_amount};

const NAME: &str = "vault_deposit_spl";

inventory::submit!(CommandDescription::new(
    NAME,
    "deposit SPL tokens from the wallet into a vault"
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
    ins.instructions.push(spl_instruction(
        "deposit_spl",
        &owner,
        &accounts,
        &input.mint,
        amount,
    )?);
    let signature = ctx.execute(ins).await?;

    let vault_ata = accounts.vault_ata(&input.mint);
    tracing::info!("deposited {} of {}, vault ata {}", amount, input.mint, vault_ata);

    Ok(Output {
        signature,
        vault_ata,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input() {
        let vault_state = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let input: Input = serde_json::from_value(serde_json::json!({
            "vault_state": vault_state.to_string(),
            "mint": mint.to_string(),
            "amount": "2.5",
            "decimals": 6,
        }))
        .unwrap();
        assert_eq!(input.decimals, Some(6));
        assert_eq!(ui_amount_to_amount(input.amount, 6).unwrap(), 2_500_000);
    }
}
