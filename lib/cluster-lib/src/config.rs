//! Client configuration.
//!
//! Values come from an optional TOML file, then environment variables
//! (see [`env`]), then command-line flags applied by the caller.

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use std::{
    collections::HashMap,
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
    sync::LazyLock,
};
use thiserror::Error as ThisError;

/// Environment variable names.
pub mod env {
    pub const SOLANA_RPC_URL: &str = "SOLANA_RPC_URL";
    pub const SOLANA_CLUSTER: &str = "SOLANA_CLUSTER";
    pub const WALLET_PATH: &str = "WALLET_PATH";
    pub const BUNDLR_ADDRESS: &str = "BUNDLR_ADDRESS";
    pub const COMPUTE_BUDGET: &str = "COMPUTE_BUDGET";
    pub const FALLBACK_COMPUTE_BUDGET: &str = "FALLBACK_COMPUTE_BUDGET";
    pub const PRIORITY_FEE: &str = "PRIORITY_FEE";
    pub const SIMULATION_COMMITMENT_LEVEL: &str = "SIMULATION_COMMITMENT_LEVEL";
    pub const TX_COMMITMENT_LEVEL: &str = "TX_COMMITMENT_LEVEL";
    pub const WAIT_COMMITMENT_LEVEL: &str = "WAIT_COMMITMENT_LEVEL";
}

pub const DEFAULT_CONFIG_PATH: &str = "cluster.toml";
pub const DEFAULT_WALLET_PATH: &str = "wba-wallet.json";

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    UnknownNetwork(#[from] UnknownNetwork),
    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolanaNet {
    #[serde(rename = "devnet")]
    Devnet,
    #[serde(rename = "testnet")]
    Testnet,
    #[serde(rename = "mainnet-beta")]
    Mainnet,
    #[serde(rename = "localnet")]
    Localnet,
}

/// Unknown Solana network.
#[derive(Debug, ThisError)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);

impl FromStr for SolanaNet {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Self::Mainnet),
            "localnet" | "localhost" => Ok(Self::Localnet),
            s => Err(UnknownNetwork(s.to_owned())),
        }
    }
}

impl Display for SolanaNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SolanaNet {
    pub fn url(&self) -> String {
        match self {
            SolanaNet::Devnet => {
                static URL: LazyLock<String> = LazyLock::new(|| {
                    std::env::var("SOLANA_DEVNET_URL")
                        .unwrap_or_else(|_| "https://api.devnet.solana.com".to_owned())
                });
                URL.clone()
            }
            SolanaNet::Testnet => {
                static URL: LazyLock<String> = LazyLock::new(|| {
                    std::env::var("SOLANA_TESTNET_URL")
                        .unwrap_or_else(|_| "https://api.testnet.solana.com".to_owned())
                });
                URL.clone()
            }
            SolanaNet::Mainnet => {
                static URL: LazyLock<String> = LazyLock::new(|| {
                    std::env::var("SOLANA_MAINNET_URL")
                        .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_owned())
                });
                URL.clone()
            }
            SolanaNet::Localnet => "http://localhost:8899".to_owned(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolanaNet::Devnet => "devnet",
            SolanaNet::Testnet => "testnet",
            SolanaNet::Mainnet => "mainnet-beta",
            SolanaNet::Localnet => "localnet",
        }
    }

    pub fn from_url(url: &str) -> Result<Self, UnknownNetwork> {
        if url.contains("devnet") {
            Ok(SolanaNet::Devnet)
        } else if url.contains("testnet") {
            Ok(SolanaNet::Testnet)
        } else if url.contains("mainnet") {
            Ok(SolanaNet::Mainnet)
        } else if url.contains("localhost") || url.contains("127.0.0.1") {
            Ok(SolanaNet::Localnet)
        } else {
            Err(UnknownNetwork(url.to_owned()))
        }
    }

    /// Query string selecting this cluster on block explorers.
    pub fn explorer_query(&self) -> String {
        match self {
            SolanaNet::Mainnet => String::new(),
            SolanaNet::Localnet => format!("?cluster=custom&customUrl={}", self.url()),
            net => format!("?cluster={}", net.as_str()),
        }
    }
}

/// How to insert a compute-budget instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, SerializeDisplay, DeserializeFromStr)]
pub enum InsertionBehavior {
    /// Estimate from a simulation.
    #[default]
    Auto,
    /// Don't insert.
    No,
    /// Insert with this value.
    Value(u64),
}

impl FromStr for InsertionBehavior {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "no" => Ok(Self::No),
            s => s.parse().map(Self::Value),
        }
    }
}

impl Display for InsertionBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertionBehavior::Auto => f.write_str("auto"),
            InsertionBehavior::No => f.write_str("no"),
            InsertionBehavior::Value(x) => x.fmt(f),
        }
    }
}

/// Controls how [`Instructions`][crate::solana::Instructions] are submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub compute_budget: InsertionBehavior,
    pub fallback_compute_budget: Option<u64>,
    pub priority_fee: InsertionBehavior,
    pub simulation_commitment_level: CommitmentLevel,
    pub tx_commitment_level: CommitmentLevel,
    pub wait_commitment_level: CommitmentLevel,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            compute_budget: InsertionBehavior::Auto,
            fallback_compute_budget: None,
            priority_fee: InsertionBehavior::No,
            simulation_commitment_level: CommitmentLevel::Confirmed,
            tx_commitment_level: CommitmentLevel::Confirmed,
            wait_commitment_level: CommitmentLevel::Confirmed,
        }
    }
}

fn parse_env<T: FromStr>(
    env: &HashMap<String, String>,
    key: &'static str,
) -> Result<Option<T>, Error> {
    env.get(key)
        .map(|value| {
            value.parse::<T>().map_err(|_| Error::InvalidEnv {
                key,
                value: value.clone(),
            })
        })
        .transpose()
}

impl ExecutionConfig {
    pub fn from_env(env: &HashMap<String, String>) -> Result<Self, Error> {
        let mut config = Self::default();
        config.apply_env(env)?;
        Ok(config)
    }

    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), Error> {
        if let Some(x) = parse_env(env, env::COMPUTE_BUDGET)? {
            self.compute_budget = x;
        }
        if let Some(x) = parse_env(env, env::FALLBACK_COMPUTE_BUDGET)? {
            self.fallback_compute_budget = Some(x);
        }
        if let Some(x) = parse_env(env, env::PRIORITY_FEE)? {
            self.priority_fee = x;
        }
        if let Some(x) = parse_env(env, env::SIMULATION_COMMITMENT_LEVEL)? {
            self.simulation_commitment_level = x;
        }
        if let Some(x) = parse_env(env, env::TX_COMMITMENT_LEVEL)? {
            self.tx_commitment_level = x;
        }
        if let Some(x) = parse_env(env, env::WAIT_COMMITMENT_LEVEL)? {
            self.wait_commitment_level = x;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub cluster: Option<SolanaNet>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlrConfig {
    pub address: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BundlrConfig {
    fn default() -> Self {
        Self {
            address: None,
            timeout_secs: 60,
        }
    }
}

impl BundlrConfig {
    /// Bundlr node for the network, `None` when no public node serves it.
    pub fn node_url(&self, network: SolanaNet) -> Option<String> {
        if let Some(address) = &self.address {
            return Some(address.trim_end_matches('/').to_owned());
        }
        match network {
            SolanaNet::Mainnet => Some("https://node1.bundlr.network".to_owned()),
            SolanaNet::Devnet => Some("https://devnet.bundlr.network".to_owned()),
            SolanaNet::Testnet | SolanaNet::Localnet => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    pub commitment: CommitmentLevel,
    pub wallet: PathBuf,
    pub bundlr: BundlrConfig,
    pub execution: ExecutionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            commitment: CommitmentLevel::Confirmed,
            wallet: DEFAULT_WALLET_PATH.into(),
            bundlr: BundlrConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Read `path` if given, otherwise [`DEFAULT_CONFIG_PATH`] when it exists.
    pub fn get_config(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => {
                tracing::debug!("no config file, using default config");
                Ok(Self::default())
            }
        }
    }

    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), Error> {
        if let Some(url) = env.get(env::SOLANA_RPC_URL) {
            self.network.url = Some(url.clone());
        }
        if let Some(cluster) = env.get(env::SOLANA_CLUSTER) {
            self.network.cluster = Some(cluster.parse()?);
        }
        if let Some(path) = env.get(env::WALLET_PATH) {
            self.wallet = path.into();
        }
        if let Some(address) = env.get(env::BUNDLR_ADDRESS) {
            self.bundlr.address = Some(address.clone());
        }
        self.execution.apply_env(env)
    }

    /// Set the commitment used for queries and for waiting on transactions.
    pub fn set_commitment(&mut self, level: CommitmentLevel) {
        self.commitment = level;
        self.execution.wait_commitment_level = level;
    }

    /// Explicit cluster, else guessed from the URL, else devnet.
    pub fn cluster(&self) -> SolanaNet {
        self.network
            .cluster
            .or_else(|| {
                self.network
                    .url
                    .as_deref()
                    .and_then(|url| SolanaNet::from_url(url).ok())
            })
            .unwrap_or(SolanaNet::Devnet)
    }

    pub fn rpc_url(&self) -> String {
        self.network
            .url
            .clone()
            .unwrap_or_else(|| self.cluster().url())
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_map<const N: usize>(kv: [(&str, &str); N]) -> HashMap<String, String> {
        kv.into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }

    #[test]
    fn test_parse_execution_env() {
        let c = ExecutionConfig::from_env(&env_map([
            (env::COMPUTE_BUDGET, "auto"),
            (env::FALLBACK_COMPUTE_BUDGET, "500000"),
            (env::PRIORITY_FEE, "1000"),
            (env::SIMULATION_COMMITMENT_LEVEL, "confirmed"),
            (env::TX_COMMITMENT_LEVEL, "finalized"),
            (env::WAIT_COMMITMENT_LEVEL, "processed"),
        ]))
        .unwrap();
        assert_eq!(
            c,
            ExecutionConfig {
                compute_budget: InsertionBehavior::Auto,
                fallback_compute_budget: Some(500000),
                priority_fee: InsertionBehavior::Value(1000),
                simulation_commitment_level: CommitmentLevel::Confirmed,
                tx_commitment_level: CommitmentLevel::Finalized,
                wait_commitment_level: CommitmentLevel::Processed,
            }
        );
    }

    #[test]
    fn test_invalid_env() {
        let error = ExecutionConfig::from_env(&env_map([(env::PRIORITY_FEE, "lots")])).unwrap_err();
        assert!(matches!(
            error,
            Error::InvalidEnv {
                key: env::PRIORITY_FEE,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_toml() {
        let c: ClientConfig = toml::from_str(
            r#"
wallet = "dev-wallet.json"
commitment = "finalized"

[network]
cluster = "localnet"

[bundlr]
timeout_secs = 30

[execution]
compute_budget = "no"
priority_fee = "250"
"#,
        )
        .unwrap();
        assert_eq!(c.wallet, PathBuf::from("dev-wallet.json"));
        assert_eq!(c.commitment, CommitmentLevel::Finalized);
        assert_eq!(c.cluster(), SolanaNet::Localnet);
        assert_eq!(c.rpc_url(), "http://localhost:8899");
        assert_eq!(c.bundlr.timeout_secs, 30);
        assert_eq!(c.bundlr.address, None);
        assert_eq!(c.execution.compute_budget, InsertionBehavior::No);
        assert_eq!(c.execution.priority_fee, InsertionBehavior::Value(250));
        assert_eq!(
            c.execution.wait_commitment_level,
            CommitmentLevel::Confirmed
        );
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.toml");
        std::fs::write(&path, "[network]\nurl = \"https://api.devnet.solana.com\"\n").unwrap();
        let c = ClientConfig::load(&path).unwrap();
        assert_eq!(c.cluster(), SolanaNet::Devnet);
        assert_eq!(c.wallet, PathBuf::from(DEFAULT_WALLET_PATH));
    }

    #[test]
    fn test_env_overrides() {
        let mut c = ClientConfig::default();
        c.apply_env(&env_map([
            (env::SOLANA_RPC_URL, "http://127.0.0.1:8899"),
            (env::WALLET_PATH, "other.json"),
            (env::COMPUTE_BUDGET, "300000"),
        ]))
        .unwrap();
        assert_eq!(c.cluster(), SolanaNet::Localnet);
        assert_eq!(c.rpc_url(), "http://127.0.0.1:8899");
        assert_eq!(c.wallet, PathBuf::from("other.json"));
        assert_eq!(c.execution.compute_budget, InsertionBehavior::Value(300000));
    }

    #[test]
    fn test_net_from_url() {
        assert_eq!(
            SolanaNet::from_url("https://api.devnet.solana.com").unwrap(),
            SolanaNet::Devnet
        );
        assert_eq!(
            SolanaNet::from_url("http://localhost:8899").unwrap(),
            SolanaNet::Localnet
        );
        assert!(SolanaNet::from_url("https://rpc.example.org").is_err());
    }

    #[test]
    fn test_explorer_query() {
        assert_eq!(SolanaNet::Devnet.explorer_query(), "?cluster=devnet");
        assert_eq!(SolanaNet::Mainnet.explorer_query(), "");
    }

    #[test]
    fn test_bundlr_node() {
        let c = BundlrConfig::default();
        assert_eq!(
            c.node_url(SolanaNet::Devnet).as_deref(),
            Some("https://devnet.bundlr.network")
        );
        assert_eq!(c.node_url(SolanaNet::Testnet), None);
        let c = BundlrConfig {
            address: Some("http://localhost:10000/".to_owned()),
            ..<_>::default()
        };
        assert_eq!(
            c.node_url(SolanaNet::Localnet).as_deref(),
            Some("http://localhost:10000")
        );
    }
}
