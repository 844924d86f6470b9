//! Services available to a running command.

use crate::{
    config::{ClientConfig, SolanaNet},
    solana::{self, Instructions, KeypairExt},
    wallet,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::signature::{Keypair, Signature};
use std::{sync::Arc, time::Duration};

pub struct Context {
    pub cfg: ClientConfig,
    pub solana_client: Arc<RpcClient>,
    pub http: reqwest::Client,
    /// Wallet loaded from [`ClientConfig::wallet`]; pays fees and signs.
    pub payer: Keypair,
}

impl Context {
    /// Load the wallet and open an RPC client.
    pub fn from_config(cfg: ClientConfig) -> Result<Self, wallet::Error> {
        let payer = wallet::read_keypair_file(&cfg.wallet)?;
        Ok(Self::with_payer(cfg, payer))
    }

    pub fn with_payer(cfg: ClientConfig, payer: Keypair) -> Self {
        let solana_client = Arc::new(RpcClient::new_with_commitment(
            cfg.rpc_url(),
            cfg.commitment_config(),
        ));
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.bundlr.timeout_secs))
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!("failed to build http client: {}", error);
                reqwest::Client::new()
            });
        tracing::debug!("using {} ({})", cfg.rpc_url(), cfg.cluster());
        Self {
            cfg,
            solana_client,
            http,
            payer,
        }
    }

    pub fn network(&self) -> SolanaNet {
        self.cfg.cluster()
    }

    pub fn payer(&self) -> Keypair {
        self.payer.clone_keypair()
    }

    /// Instructions paid for and signed by the wallet.
    pub fn instructions(&self) -> Instructions {
        Instructions::new(&self.payer)
    }

    pub async fn execute(&self, instructions: Instructions) -> Result<Signature, solana::Error> {
        instructions
            .execute(&self.solana_client, &self.cfg.execution)
            .await
    }
}
