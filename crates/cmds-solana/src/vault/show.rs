use super::{VaultAccounts, VaultState, VAULT_STATE_ACCOUNT};
use crate::{prelude::*, utils::fetch_anchor_account};

const NAME: &str = "vault_show";

inventory::submit!(CommandDescription::new(
    NAME,
    "show a vault state and the balance of its SOL vault"
));

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub vault_state: Pubkey,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    pub state: VaultState,
    #[serde_as(as = "DisplayFromStr")]
    pub vault_auth: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub vault: Pubkey,
    pub vault_lamports: u64,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let state: VaultState =
        fetch_anchor_account(&ctx.solana_client, &input.vault_state, VAULT_STATE_ACCOUNT).await?;
    let accounts = VaultAccounts::new(input.vault_state);
    let vault_lamports = ctx
        .solana_client
        .get_balance(&accounts.vault)
        .await
        .map_err(crate::Error::from)?;

    Ok(Output {
        state,
        vault_auth: accounts.vault_auth,
        vault: accounts.vault,
        vault_lamports,
    })
}
