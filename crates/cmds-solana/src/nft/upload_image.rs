use super::Uploader;
use crate::prelude::*;
use std::path::PathBuf;

const NAME: &str = "upload_image";

inventory::submit!(CommandDescription::new(
    NAME,
    "upload an image file to arweave through bundlr"
));

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    pub path: PathBuf,
    #[serde(default = "default_true")]
    pub fund_bundlr: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    pub uri: String,
    pub content_type: String,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let path = input.path.to_string_lossy().into_owned();
    let content_type = super::uploader::content_type(&path)?;

    let mut uploader = Uploader::new(ctx)?;
    if input.fund_bundlr {
        uploader.lazy_fund(&path).await?;
    }
    let uri = uploader.upload_file(&path).await?;

    Ok(Output { uri, content_type })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_lib::{wallet, ClientConfig};

    #[test]
    fn test_input() {
        let input: Input =
            serde_json::from_value(serde_json::json!({ "path": "./images/generug.png" })).unwrap();
        assert!(input.fund_bundlr);
        assert_eq!(input.path, PathBuf::from("./images/generug.png"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::with_payer(ClientConfig::default(), Keypair::new());
        let result = run(
            &ctx,
            Input {
                path: dir.path().join("missing.png"),
                fund_bundlr: false,
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "uploads to the bundlr devnet node"]
    async fn test_upload_devnet() {
        tracing_subscriber::fmt::try_init().ok();

        let payer = wallet::read_keypair_file("wba-wallet.json").unwrap();
        let ctx = Context::with_payer(ClientConfig::default(), payer);
        let output = run(
            &ctx,
            Input {
                path: "images/generug.png".into(),
                fund_bundlr: true,
            },
        )
        .await
        .unwrap();
        assert!(output.uri.starts_with("https://arweave.net/"));
    }
}
