//! Permanent storage on Arweave through a Bundlr node, paid in SOL by the wallet.

use super::NftMetadata;
use crate::prelude::*;
use bundlr_sdk::{error::BundlrError, tags::Tag, Bundlr};
use bytes::Bytes;
use std::{
    collections::{HashMap, HashSet},
    path::Path,
    time::Duration,
};

pub struct BundlrSigner {
    keypair: Keypair,
}

impl BundlrSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

impl bundlr_sdk::Signer for BundlrSigner {
    // ed25519
    const SIG_TYPE: u16 = 2;
    const SIG_LENGTH: u16 = 64;
    const PUB_LENGTH: u16 = 32;

    fn sign(&self, msg: Bytes) -> Result<Bytes, BundlrError> {
        let sig = self.keypair.sign_message(&msg);
        Ok(<[u8; 64]>::from(sig).to_vec().into())
    }

    fn pub_key(&self) -> Bytes {
        self.keypair.pubkey().to_bytes().to_vec().into()
    }
}

#[derive(Deserialize)]
struct BundlrResponse {
    id: String,
}

pub fn arweave_url(id: &str) -> String {
    format!("https://arweave.net/{}", id)
}

fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Already stored on Arweave, nothing to upload.
pub fn is_stored(path: &str) -> bool {
    path.starts_with("https://arweave.net/")
}

pub struct Uploader<'a> {
    ctx: &'a Context,
    node_url: String,
    cache: HashMap<String, String>,
    content_cache: HashMap<String, Bytes>,
}

impl<'a> Uploader<'a> {
    pub fn new(ctx: &'a Context) -> crate::Result<Self> {
        let network = ctx.network();
        let node_url = ctx
            .cfg
            .bundlr
            .node_url(network)
            .ok_or(crate::Error::BundlrNotAvailable(network))?;
        tracing::debug!("using bundlr node {}", node_url);

        Ok(Self {
            ctx,
            node_url,
            cache: HashMap::new(),
            content_cache: HashMap::new(),
        })
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// Fund the node with enough to store `file_path`.
    pub async fn lazy_fund(&mut self, file_path: &str) -> crate::Result<()> {
        let needed_size = self.get_file_size(file_path).await? + 10_000;
        self.fund_size(needed_size).await
    }

    /// Fund the node with enough to store the metadata JSON and every file
    /// it references.
    pub async fn lazy_fund_metadata(&mut self, metadata: &NftMetadata) -> crate::Result<()> {
        let mut processed = HashSet::new();
        let metadata_size = serde_json::to_vec(metadata)?.len() as u64;

        let mut needed_size = metadata_size;
        for path in referenced_files(metadata) {
            if !is_stored(&path) && processed.insert(path.clone()) {
                needed_size += self.get_file_size(&path).await?;
            }
        }

        needed_size += 100_000; // tx_fee + some offset
        needed_size += metadata_size * 4 / 10; // metadata change offset

        self.fund_size(needed_size).await
    }

    async fn fund_size(&self, size: u64) -> crate::Result<()> {
        let needed_balance = self.get_price(size).await?;
        let needed_balance = needed_balance + needed_balance / 10;

        let current_balance = self.get_current_balance().await?;
        tracing::debug!(
            "bundlr balance {} lamports, needed {} for {} bytes",
            current_balance,
            needed_balance,
            size
        );

        if current_balance < needed_balance {
            self.fund(needed_balance - current_balance).await?;
        }

        Ok(())
    }

    async fn get_file(&mut self, path: &str) -> crate::Result<Bytes> {
        if let Some(content) = self.content_cache.get(path) {
            return Ok(content.clone());
        }
        let data: Bytes = if is_remote(path) {
            self.ctx.http.get(path).send().await?.bytes().await?
        } else {
            tokio::fs::read(path).await?.into()
        };
        self.content_cache.insert(path.to_owned(), data.clone());
        Ok(data)
    }

    async fn get_file_size(&mut self, path: &str) -> crate::Result<u64> {
        Ok(self.get_file(path).await?.len() as u64)
    }

    /// Price in lamports to store `size` bytes.
    pub async fn get_price(&self, size: u64) -> crate::Result<u64> {
        let resp = self
            .ctx
            .http
            .get(format!("{}/price/solana/{}", &self.node_url, size))
            .send()
            .await?;
        let text = resp.text().await?;
        text.trim()
            .parse::<u64>()
            .map_err(|_| crate::Error::BundlrApiInvalidResponse(text.clone()))
    }

    pub async fn get_current_balance(&self) -> crate::Result<u64> {
        #[serde_as]
        #[derive(Deserialize)]
        struct Resp {
            #[serde_as(as = "DisplayFromStr")]
            balance: u64,
        }

        let resp = self
            .ctx
            .http
            .get(format!(
                "{}/account/balance/solana/?address={}",
                &self.node_url,
                self.ctx.payer.pubkey()
            ))
            .send()
            .await?;

        if resp.status().is_success() {
            let resp = resp.json::<Resp>().await?;
            Ok(resp.balance)
        } else {
            let text = resp.text().await?;
            Err(crate::Error::BundlrApiInvalidResponse(text))
        }
    }

    /// Transfer `amount` lamports to the node and register the transaction.
    pub async fn fund(&self, amount: u64) -> crate::Result<Signature> {
        #[derive(Deserialize)]
        struct Addresses {
            solana: String,
        }

        #[derive(Deserialize)]
        struct Info {
            addresses: Addresses,
        }

        let resp = self
            .ctx
            .http
            .get(format!("{}/info", &self.node_url))
            .send()
            .await?;
        let info: Info = serde_json::from_str(&resp.text().await?)?;

        let recipient = info
            .addresses
            .solana
            .parse::<Pubkey>()
            .map_err(|_| crate::Error::BundlrApiInvalidResponse(info.addresses.solana.clone()))?;

        tracing::info!("funding bundlr with {} lamports", amount);
        let mut ins = self.ctx.instructions();
        ins.instructions.push(solana_sdk::system_instruction::transfer(
            &self.ctx.payer.pubkey(),
            &recipient,
            amount,
        ));
        let signature = self.ctx.execute(ins).await?;

        let resp = self
            .ctx
            .http
            .post(format!("{}/account/balance/solana", &self.node_url))
            .json(&serde_json::json!({
                "tx_id": signature.to_string(),
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(crate::Error::BundlrTxRegisterFailed(signature.to_string()));
        }

        Ok(signature)
    }

    /// Upload a local file or the content of a URL, returns its Arweave URL.
    pub async fn upload_file(&mut self, file_path: &str) -> crate::Result<String> {
        if let Some(url) = self.cache.get(file_path) {
            return Ok(url.clone());
        }

        let content_type = content_type(file_path)?;
        let data = self.get_file(file_path).await?;

        let url = self.upload(data, content_type).await?;
        tracing::info!("uploaded {} to {}", file_path, url);

        self.cache.insert(file_path.to_owned(), url.clone());

        Ok(url)
    }

    pub async fn upload(&self, data: Bytes, content_type: String) -> crate::Result<String> {
        let bundlr = Bundlr::new(
            self.node_url.clone(),
            "solana".to_string(),
            "sol".to_string(),
            BundlrSigner::new(self.ctx.payer()),
        );

        let (bundlr, tx) = tokio::task::spawn_blocking(move || {
            let tx = bundlr.create_transaction_with_tags(
                data.to_vec(),
                vec![Tag::new("Content-Type".into(), content_type)],
            );
            (bundlr, tx)
        })
        .await
        .map_err(|error| {
            crate::Error::custom(anyhow::anyhow!(
                "failed to create and sign bundlr transaction: {}",
                error
            ))
        })?;

        let timeout = Duration::from_secs(self.ctx.cfg.bundlr.timeout_secs);
        let resp = tokio::time::timeout(timeout, bundlr.send_transaction(tx))
            .await
            .map_err(|_| crate::Error::BundlrTimeout)??;
        let resp: BundlrResponse = serde_json::from_value(resp)?;

        Ok(arweave_url(&resp.id))
    }
}

/// Files uploaded along with the metadata: the image and `properties.files`.
fn referenced_files(metadata: &NftMetadata) -> Vec<String> {
    let mut files = vec![metadata.image.clone()];
    if let Some(properties_files) = metadata
        .properties
        .as_ref()
        .and_then(|p| p.files.as_ref())
    {
        files.extend(properties_files.iter().map(|f| f.uri.clone()));
    }
    files
}

pub fn content_type(path: &str) -> crate::Result<String> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    mime_guess::from_path(Path::new(path))
        .first()
        .map(|mime| mime.to_string())
        .ok_or(crate::Error::MimeTypeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nft::{NftMetadataFile, NftMetadataProperties};
    use bundlr_sdk::Signer as _;
    use cluster_lib::{ClientConfig, SolanaNet};

    fn context(cluster: SolanaNet) -> Context {
        let mut cfg = ClientConfig::default();
        cfg.network.cluster = Some(cluster);
        Context::with_payer(cfg, Keypair::new())
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("./images/generug.png").unwrap(), "image/png");
        assert_eq!(content_type("metadata.json").unwrap(), "application/json");
        assert_eq!(
            content_type("https://example.com/a.jpg?size=2").unwrap(),
            "image/jpeg"
        );
        assert!(matches!(
            content_type("no_extension"),
            Err(crate::Error::MimeTypeNotFound)
        ));
    }

    #[test]
    fn test_node_url() {
        let ctx = context(SolanaNet::Devnet);
        let uploader = Uploader::new(&ctx).unwrap();
        assert_eq!(uploader.node_url(), "https://devnet.bundlr.network");

        let ctx = context(SolanaNet::Testnet);
        assert!(matches!(
            Uploader::new(&ctx),
            Err(crate::Error::BundlrNotAvailable(SolanaNet::Testnet))
        ));
    }

    #[test]
    fn test_signer() {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        let signer = BundlrSigner::new(keypair);
        assert_eq!(signer.pub_key().as_ref(), pubkey.as_ref());

        let msg = Bytes::from_static(b"data item");
        let sig = signer.sign(msg.clone()).unwrap();
        assert_eq!(sig.len(), 64);
        let sig = Signature::try_from(sig.as_ref()).unwrap();
        assert!(sig.verify(pubkey.as_ref(), &msg));
    }

    #[test]
    fn test_referenced_files() {
        let metadata = NftMetadata {
            name: "Sore Rug".to_owned(),
            symbol: "SRR".to_owned(),
            description: String::new(),
            seller_fee_basis_points: 420,
            image: "generug.png".to_owned(),
            animation_url: None,
            external_url: None,
            attributes: vec![],
            properties: Some(NftMetadataProperties {
                files: Some(vec![NftMetadataFile {
                    uri: "generug.png".to_owned(),
                    kind: "image/png".to_owned(),
                }]),
                category: None,
            }),
            creators: None,
        };
        assert_eq!(referenced_files(&metadata), ["generug.png", "generug.png"]);
        assert!(is_stored(&arweave_url("abc")));
        assert!(!is_stored("generug.png"));
    }
}
