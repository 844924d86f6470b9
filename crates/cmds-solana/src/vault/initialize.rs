use super::{initialize_instruction, VaultAccounts};
use crate::prelude::*;
use cluster_lib::wallet;
use std::path::PathBuf;

const NAME: &str = "vault_initialize";

inventory::submit!(CommandDescription::new(
    NAME,
    "create a vault owned by the wallet"
));

pub const DEFAULT_VAULT_STATE_PATH: &str = "vault-state.json";

fn default_path() -> PathBuf {
    DEFAULT_VAULT_STATE_PATH.into()
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    /// Where the new vault state keypair is saved.
    #[serde(default = "default_path")]
    pub vault_state_path: PathBuf,
    #[serde(default)]
    pub force: bool,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub vault_state: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub vault_auth: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub vault: Pubkey,
    pub vault_state_path: PathBuf,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let vault_state = Keypair::new();
    // saved first, later commands need the address
    wallet::write_keypair_file(&vault_state, &input.vault_state_path, input.force)?;
    tracing::info!(
        "saved vault state {} to {}",
        vault_state.pubkey(),
        input.vault_state_path.display()
    );

    let accounts = VaultAccounts::new(vault_state.pubkey());
    let mut ins = ctx.instructions();
    ins.push_signer(&vault_state);
    ins.instructions
        .push(initialize_instruction(&ctx.payer.pubkey(), &accounts)?);
    let signature = ctx.execute(ins).await?;

    Ok(Output {
        signature,
        vault_state: accounts.vault_state,
        vault_auth: accounts.vault_auth,
        vault: accounts.vault,
        vault_state_path: input.vault_state_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_lib::ClientConfig;

    #[test]
    fn test_input_defaults() {
        let input: Input = serde_json::from_str("{}").unwrap();
        assert_eq!(input.vault_state_path, PathBuf::from("vault-state.json"));
        assert!(!input.force);
    }

    #[tokio::test]
    async fn test_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault-state.json");
        let existing = Keypair::new();
        wallet::write_keypair_file(&existing, &path, false).unwrap();

        let ctx = Context::with_payer(ClientConfig::default(), Keypair::new());
        let result = run(
            &ctx,
            Input {
                vault_state_path: path.clone(),
                force: false,
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(
            wallet::read_keypair_file(&path).unwrap().pubkey(),
            existing.pubkey()
        );
    }
}
