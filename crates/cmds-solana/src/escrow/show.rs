use super::{find_vault, Escrow, ESCROW_ACCOUNT};
use crate::{prelude::*, utils::fetch_anchor_account};

const NAME: &str = "escrow_show";

inventory::submit!(CommandDescription::new(
    NAME,
    "show an escrow and the amount locked in its vault"
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
    pub state: Escrow,
    #[serde_as(as = "DisplayFromStr")]
    pub vault: Pubkey,
    /// `None` once the vault is closed.
    pub vault_amount: Option<String>,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let state: Escrow =
        fetch_anchor_account(&ctx.solana_client, &input.escrow, ESCROW_ACCOUNT).await?;
    let (vault, _) = find_vault(&input.escrow);
    let vault_amount = ctx
        .solana_client
        .get_token_account_balance(&vault)
        .await
        .ok()
        .map(|balance| balance.ui_amount_string);

    Ok(Output {
        state,
        vault,
        vault_amount,
    })
}
