use super::NftCreator;
use crate::{
    prelude::*,
    spl::{create_metadata::create_metadata_instruction, create_mint::create_mint_instructions},
};
use cluster_lib::solana::solscan_token_url;
use mpl_token_metadata::{
    accounts::MasterEdition,
    instructions::{CreateMasterEditionV3, CreateMasterEditionV3InstructionArgs},
    types::DataV2,
};
use solana_program::system_program;
use solana_sdk::program_pack::Pack;
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};

const NAME: &str = "mint_nft";

inventory::submit!(CommandDescription::new(
    NAME,
    "mint a one of one NFT with metadata and a master edition"
));

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    /// Off-chain metadata JSON.
    pub uri: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub seller_fee_basis_points: u16,
    #[serde(default = "default_true")]
    pub is_mutable: bool,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub metadata: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub master_edition: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub token_account: Pubkey,
    pub url: String,
}

pub struct MintNftAccounts {
    pub metadata: Pubkey,
    pub master_edition: Pubkey,
    pub token_account: Pubkey,
}

/// Create the mint, mint a single token to `owner` and lock the supply
/// with a master edition.
pub fn mint_nft_instructions(
    owner: &Pubkey,
    mint: &Pubkey,
    rent: u64,
    input: &Input,
) -> crate::Result<(Vec<Instruction>, MintNftAccounts)> {
    let token_account = get_associated_token_address(owner, mint);

    let mut instructions = create_mint_instructions(owner, mint, owner, Some(owner), 0, rent)?;
    instructions.push(create_associated_token_account_idempotent(
        owner,
        owner,
        mint,
        &spl_token::id(),
    ));
    instructions.push(spl_token::instruction::mint_to_checked(
        &spl_token::id(),
        mint,
        &token_account,
        owner,
        &[],
        1,
        0,
    )?);

    let data = DataV2 {
        name: input.name.clone(),
        symbol: input.symbol.clone(),
        uri: input.uri.clone(),
        seller_fee_basis_points: input.seller_fee_basis_points,
        creators: Some(vec![NftCreator {
            verified: Some(true),
            ..NftCreator::sole(*owner)
        }
        .into()]),
        collection: None,
        uses: None,
    };
    let (metadata, create_metadata) =
        create_metadata_instruction(mint, owner, data, input.is_mutable);
    instructions.push(create_metadata);

    let (master_edition, _) = MasterEdition::find_pda(mint);
    instructions.push(
        CreateMasterEditionV3 {
            edition: master_edition,
            mint: *mint,
            update_authority: *owner,
            mint_authority: *owner,
            payer: *owner,
            metadata,
            token_program: spl_token::id(),
            system_program: system_program::id(),
            rent: None,
        }
        .instruction(CreateMasterEditionV3InstructionArgs {
            max_supply: Some(0),
        }),
    );

    Ok((
        instructions,
        MintNftAccounts {
            metadata,
            master_edition,
            token_account,
        },
    ))
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let mint = Keypair::new();
    let rent = ctx
        .solana_client
        .get_minimum_balance_for_rent_exemption(spl_token::state::Mint::LEN)
        .await
        .map_err(crate::Error::from)?;

    let (instructions, accounts) =
        mint_nft_instructions(&ctx.payer.pubkey(), &mint.pubkey(), rent, &input)?;

    let mut ins = ctx.instructions();
    ins.push_signer(&mint);
    ins.instructions = instructions;
    let signature = ctx.execute(ins).await?;

    let url = solscan_token_url(&mint.pubkey(), ctx.network());
    tracing::info!("minted {}", url);

    Ok(Output {
        signature,
        mint: mint.pubkey(),
        metadata: accounts.metadata,
        master_edition: accounts.master_edition,
        token_account: accounts.token_account,
        url,
    })
}
