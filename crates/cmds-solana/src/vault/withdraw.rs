use super::{lamports_instruction, VaultAccounts};
use crate::{prelude::*, utils::sol_to_lamports};

const NAME: &str = "vault_withdraw";

inventory::submit!(CommandDescription::new(
    NAME,
    "withdraw SOL from a vault to the wallet"
));

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub vault_state: Pubkey,
    /// Amount in SOL.
    pub amount: Decimal,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub vault: Pubkey,
    pub lamports: u64,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let lamports = sol_to_lamports(input.amount)?;
    let accounts = VaultAccounts::new(input.vault_state);

    let mut ins = ctx.instructions();
    ins.instructions.push(lamports_instruction(
        "withdraw",
        &ctx.payer.pubkey(),
        &accounts,
        lamports,
    )?);
    let signature = ctx.execute(ins).await?;
    tracing::info!("withdrew {} lamports, vault {}", lamports, accounts.vault);

    Ok(Output {
        signature,
        vault: accounts.vault,
        lamports,
    })
}
