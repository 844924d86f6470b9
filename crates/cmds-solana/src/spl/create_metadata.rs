use crate::{nft::NftCreator, prelude::*};
use mpl_token_metadata::{
    accounts::Metadata,
    instructions::{CreateMetadataAccountV3, CreateMetadataAccountV3InstructionArgs},
    types::DataV2,
};
use solana_program::system_program;

const NAME: &str = "create_metadata";

inventory::submit!(CommandDescription::new(
    NAME,
    "create a token metadata account for a mint"
));

fn default_true() -> bool {
    true
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub seller_fee_basis_points: u16,
    #[serde(default)]
    pub creators: Option<Vec<NftCreator>>,
    #[serde(default = "default_true")]
    pub is_mutable: bool,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub metadata: Pubkey,
}

/// `CreateMetadataAccountV3` with the wallet as payer, mint authority and update authority.
pub fn create_metadata_instruction(
    mint: &Pubkey,
    authority: &Pubkey,
    data: DataV2,
    is_mutable: bool,
) -> (Pubkey, Instruction) {
    let (metadata, _) = Metadata::find_pda(mint);
    let ix = CreateMetadataAccountV3 {
        metadata,
        mint: *mint,
        mint_authority: *authority,
        payer: *authority,
        update_authority: (*authority, true),
        system_program: system_program::id(),
        rent: None,
    }
    .instruction(CreateMetadataAccountV3InstructionArgs {
        data,
        is_mutable,
        collection_details: None,
    });
    (metadata, ix)
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let data = DataV2 {
        name: input.name,
        symbol: input.symbol,
        uri: input.uri,
        seller_fee_basis_points: input.seller_fee_basis_points,
        creators: input
            .creators
            .map(|v| v.into_iter().map(Into::into).collect()),
        collection: None,
        uses: None,
    };
    let (metadata, ix) =
        create_metadata_instruction(&input.mint, &ctx.payer.pubkey(), data, input.is_mutable);

    let mut ins = ctx.instructions();
    ins.instructions.push(ix);
    let signature = ctx.execute(ins).await?;
    tracing::info!("created metadata {} for {}", metadata, input.mint);

    Ok(Output {
        signature,
        metadata,
    })
}
