use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{program_pack::Pack, pubkey::Pubkey};
use tracing::info;

pub mod command;
pub mod error;

pub mod escrow;
pub mod find_pda;
pub mod generate_keypair;
pub mod nft;
pub mod request_airdrop;
pub mod spl;
pub mod utils;
pub mod vault;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::command::{CommandDescription, CommandError};
    pub use cluster_lib::{
        solana::{Instructions, KeypairExt},
        Context, SolanaNet,
    };
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
    pub use serde_with::{serde_as, DisplayFromStr};
    pub use solana_client::nonblocking::rpc_client::RpcClient;
    pub use solana_sdk::{
        instruction::{AccountMeta, Instruction},
        pubkey::Pubkey,
        signature::{Keypair, Signature},
        signer::Signer,
    };
    pub use std::sync::Arc;
}

pub async fn get_decimals(client: &RpcClient, mint_account: Pubkey) -> crate::Result<u8> {
    let account = client
        .get_account_with_commitment(&mint_account, client.commitment())
        .await?
        .value
        .ok_or(crate::Error::AccountNotFound(mint_account))?;
    let mint = spl_token::state::Mint::unpack(&account.data)?;
    info!("{} has {} decimals", mint_account, mint.decimals);
    Ok(mint.decimals)
}
