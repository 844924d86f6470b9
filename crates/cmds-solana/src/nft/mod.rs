use crate::prelude::Pubkey;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub mod mint_nft;
pub mod upload_image;
pub mod upload_metadata;
pub mod uploader;

pub use uploader::Uploader;

/// Off-chain metadata JSON, stored on Arweave and referenced by the
/// on-chain metadata `uri`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NftMetadata {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seller_fee_basis_points: u16,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default)]
    pub attributes: Vec<NftMetadataAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<NftMetadataProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creators: Option<Vec<NftCreator>>,
}

impl NftMetadata {
    /// Metadata of a single image NFT with one creator receiving all royalties.
    pub fn single_image(
        name: String,
        symbol: String,
        description: String,
        image: String,
        image_type: String,
        creator: Pubkey,
        seller_fee_basis_points: u16,
    ) -> Self {
        Self {
            name,
            symbol,
            description,
            seller_fee_basis_points,
            image: image.clone(),
            animation_url: None,
            external_url: None,
            attributes: Vec::new(),
            properties: Some(NftMetadataProperties {
                files: Some(vec![NftMetadataFile {
                    uri: image,
                    kind: image_type,
                }]),
                category: None,
            }),
            creators: Some(vec![NftCreator::sole(creator)]),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NftMetadataAttribute {
    pub trait_type: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NftMetadataProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<NftMetadataFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NftMetadataFile {
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct NftCreator {
    #[serde_as(as = "DisplayFromStr")]
    pub address: Pubkey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    pub share: u8, // in percentage not basis points
}

impl NftCreator {
    /// Sole creator receiving all royalties.
    pub fn sole(address: Pubkey) -> Self {
        Self {
            address,
            verified: None,
            share: 100,
        }
    }
}

impl From<NftCreator> for mpl_token_metadata::types::Creator {
    fn from(v: NftCreator) -> Self {
        mpl_token_metadata::types::Creator {
            address: v.address,
            verified: v.verified.unwrap_or(false),
            share: v.share,
        }
    }
}
