use crate::prelude::*;
use cluster_lib::wallet;
use std::path::PathBuf;

const NAME: &str = "generate_keypair";

inventory::submit!(CommandDescription::new(
    NAME,
    "generate a keypair and save it as a wallet file"
));

#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    pub path: PathBuf,
    #[serde(default)]
    pub force: bool,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub pubkey: Pubkey,
    pub path: PathBuf,
}

pub fn run(input: Input) -> Result<Output, CommandError> {
    let keypair = Keypair::new();
    wallet::write_keypair_file(&keypair, &input.path, input.force)?;
    tracing::info!("wrote {} to {}", keypair.pubkey(), input.path.display());
    Ok(Output {
        pubkey: keypair.pubkey(),
        path: input.path,
    })
}
