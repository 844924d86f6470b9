use super::{uploader::is_stored, NftMetadata, Uploader};
use crate::prelude::*;

const NAME: &str = "upload_metadata";

inventory::submit!(CommandDescription::new(
    NAME,
    "upload NFT metadata JSON to arweave, along with any local files it references"
));

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    pub metadata: NftMetadata,
    #[serde(default = "default_true")]
    pub fund_bundlr: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    pub uri: String,
    pub updated_metadata: NftMetadata,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let Input {
        mut metadata,
        fund_bundlr,
    } = input;

    let mut uploader = Uploader::new(ctx)?;
    if fund_bundlr {
        uploader.lazy_fund_metadata(&metadata).await?;
    }

    if !is_stored(&metadata.image) {
        metadata.image = uploader.upload_file(&metadata.image).await?;
    }

    if let Some(files) = metadata
        .properties
        .as_mut()
        .and_then(|p| p.files.as_mut())
    {
        for file in files.iter_mut() {
            if !is_stored(&file.uri) {
                file.uri = uploader.upload_file(&file.uri).await?;
            }
        }
    }

    let uri = uploader
        .upload(
            serde_json::to_vec(&metadata)?.into(),
            "application/json".to_owned(),
        )
        .await?;

    Ok(Output {
        uri,
        updated_metadata: metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_lib::{wallet, ClientConfig};

    #[test]
    fn test_input() {
        let input: Input = serde_json::from_value(serde_json::json!({
            "metadata": {
                "name": "Sore Rug",
                "symbol": "SRR",
                "image": "https://arweave.net/9eYZxp9Gl3bK3kuAY8O1DxhBOae_3wK4uUAW5uMogOs",
            },
            "fund_bundlr": false,
        }))
        .unwrap();
        assert!(!input.fund_bundlr);
        assert!(is_stored(&input.metadata.image));
        assert!(input.metadata.attributes.is_empty());
    }

    #[tokio::test]
    #[ignore = "uploads to the bundlr devnet node"]
    async fn test_upload_devnet() {
        tracing_subscriber::fmt::try_init().ok();

        let payer = wallet::read_keypair_file("wba-wallet.json").unwrap();
        let image = "https://arweave.net/9eYZxp9Gl3bK3kuAY8O1DxhBOae_3wK4uUAW5uMogOs";
        let metadata = NftMetadata::single_image(
            "Sore Rug".to_owned(),
            "SRR".to_owned(),
            "Rug of SoreviR".to_owned(),
            image.to_owned(),
            "image/png".to_owned(),
            payer.pubkey(),
            420,
        );
        let ctx = Context::with_payer(ClientConfig::default(), payer);
        let output = run(
            &ctx,
            Input {
                metadata,
                fund_bundlr: true,
            },
        )
        .await
        .unwrap();
        assert!(output.uri.starts_with("https://arweave.net/"));
        assert_eq!(output.updated_metadata.image, image);
    }
}
