#![allow(clippy::print_stdout, clippy::print_stderr)]

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use cluster_lib::{
    solana::{explorer_tx_url, solscan_tx_url},
    wallet, ClientConfig, Context, SolanaNet,
};
use cmds_solana::{
    escrow, find_pda, generate_keypair,
    nft::{self, NftMetadata},
    request_airdrop, spl, vault,
};
use rust_decimal::Decimal;
use serde::Serialize;
use solana_sdk::{commitment_config::CommitmentLevel, pubkey::Pubkey, signer::Signer};
use std::{collections::HashMap, path::PathBuf, str::FromStr};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cluster", version, about = "Solana cluster clients")]
struct Args {
    /// TOML config file (default: ./cluster.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// RPC URL, overrides the cluster's default URL
    #[arg(long, short = 'u', global = true)]
    url: Option<String>,
    /// devnet, testnet, mainnet-beta or localnet
    #[arg(long, global = true)]
    cluster: Option<SolanaNet>,
    /// Wallet keypair file
    #[arg(long, short = 'k', global = true)]
    wallet: Option<PathBuf>,
    #[arg(long, global = true, value_enum)]
    commitment: Option<Commitment>,
    /// Print command output as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl From<Commitment> for CommitmentLevel {
    fn from(c: Commitment) -> Self {
        match c {
            Commitment::Processed => CommitmentLevel::Processed,
            Commitment::Confirmed => CommitmentLevel::Confirmed,
            Commitment::Finalized => CommitmentLevel::Finalized,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new keypair file
    Keygen {
        #[arg(default_value = "wba-wallet.json")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Request an airdrop of SOL
    Airdrop {
        #[arg(default_value = "1")]
        amount: Decimal,
        /// Recipient, defaults to the wallet
        #[arg(long)]
        to: Option<Pubkey>,
    },
    /// Derive a program address
    Pda {
        program_id: Pubkey,
        /// Pubkeys, `u64:<n>`, `u8:<n>`, `hex:<bytes>` or UTF-8 strings
        seeds: Vec<String>,
    },
    /// SPL tokens
    Spl {
        #[command(subcommand)]
        command: SplCommands,
    },
    /// NFTs and Arweave uploads
    Nft {
        #[command(subcommand)]
        command: NftCommands,
    },
    /// WBA vault program
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },
    /// Escrow program
    Escrow {
        #[command(subcommand)]
        command: EscrowCommands,
    },
    /// List available commands
    List,
}

#[derive(Subcommand, Debug)]
enum SplCommands {
    /// Create a mint owned by the wallet
    Init {
        #[arg(long, default_value_t = 9)]
        decimals: u8,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Create token metadata for a mint
    Metadata {
        mint: Pubkey,
        #[arg(long, default_value = "Sore")]
        name: String,
        #[arg(long, default_value = "SR")]
        symbol: String,
        #[arg(long, default_value = "")]
        uri: String,
    },
    /// Mint tokens
    Mint {
        mint: Pubkey,
        amount: Decimal,
        /// Owner of the receiving account, defaults to the wallet
        #[arg(long)]
        to: Option<Pubkey>,
        #[arg(long)]
        decimals: Option<u8>,
    },
    /// Transfer tokens
    Transfer {
        mint: Pubkey,
        /// Wallet or token account
        to: Pubkey,
        amount: Decimal,
        #[arg(long)]
        decimals: Option<u8>,
        #[arg(long, default_value = "")]
        memo: String,
        /// Fail when the recipient has no SOL
        #[arg(long)]
        require_funded: bool,
    },
}

#[derive(Subcommand, Debug)]
enum NftCommands {
    /// Upload an image
    Image {
        path: PathBuf,
        /// Don't top up the Bundlr balance
        #[arg(long)]
        no_fund: bool,
    },
    /// Upload metadata JSON, from a file or built from flags
    Metadata {
        /// Metadata JSON file, other metadata flags are ignored
        #[arg(long)]
        file: Option<PathBuf>,
        /// Image URI or local path
        #[arg(long, required_unless_present = "file")]
        image: Option<String>,
        #[arg(long, default_value = "Sore Rug")]
        name: String,
        #[arg(long, default_value = "SRR")]
        symbol: String,
        #[arg(long, default_value = "Rug of SoreviR")]
        description: String,
        #[arg(long, default_value = "image/png")]
        image_type: String,
        #[arg(long, default_value_t = 420)]
        seller_fee_basis_points: u16,
        #[arg(long)]
        no_fund: bool,
    },
    /// Mint an NFT
    Mint {
        /// Metadata URI
        uri: String,
        #[arg(long, default_value = "Sore RUG")]
        name: String,
        #[arg(long, default_value = "SRR")]
        symbol: String,
        #[arg(long, default_value_t = 420)]
        seller_fee_basis_points: u16,
        #[arg(long)]
        immutable: bool,
    },
}

#[derive(Subcommand, Debug)]
enum VaultCommands {
    /// Create a vault
    Initialize {
        /// Where to save the vault state keypair
        #[arg(long, default_value = vault::initialize::DEFAULT_VAULT_STATE_PATH)]
        out: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Deposit SOL
    Deposit {
        /// Vault state address or keypair file
        vault_state: String,
        amount: Decimal,
    },
    /// Withdraw SOL
    Withdraw {
        /// Vault state address or keypair file
        vault_state: String,
        amount: Decimal,
    },
    /// Deposit SPL tokens
    DepositSpl {
        /// Vault state address or keypair file
        vault_state: String,
        mint: Pubkey,
        amount: Decimal,
        #[arg(long)]
        decimals: Option<u8>,
    },
    /// Withdraw SPL tokens
    WithdrawSpl {
        /// Vault state address or keypair file
        vault_state: String,
        mint: Pubkey,
        amount: Decimal,
        #[arg(long)]
        decimals: Option<u8>,
    },
    /// Show a vault
    Show {
        /// Vault state address or keypair file
        vault_state: String,
    },
}

#[derive(Subcommand, Debug)]
enum EscrowCommands {
    /// Lock tokens in a new escrow
    Make {
        maker_token: Pubkey,
        taker_token: Pubkey,
        deposit_amount: Decimal,
        offer_amount: Decimal,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Accept an escrow
    Take { escrow: Pubkey },
    /// Cancel an escrow and get the tokens back
    Refund { escrow: Pubkey },
    /// Show an escrow
    Show { escrow: Pubkey },
}

/// A base58 address, or the public key of a keypair file.
fn parse_address(s: &str) -> anyhow::Result<Pubkey> {
    match Pubkey::from_str(s) {
        Ok(pubkey) => Ok(pubkey),
        Err(_) => Ok(wallet::read_keypair_file(s)?.pubkey()),
    }
}

fn build_config(args: &Args, env: &HashMap<String, String>) -> anyhow::Result<ClientConfig> {
    let mut cfg = ClientConfig::get_config(args.config.as_deref())?;
    cfg.apply_env(env)?;
    if let Some(url) = &args.url {
        cfg.network.url = Some(url.clone());
    }
    if let Some(cluster) = args.cluster {
        cfg.network.cluster = Some(cluster);
    }
    if let Some(wallet) = &args.wallet {
        cfg.wallet = wallet.clone();
    }
    if let Some(commitment) = args.commitment {
        cfg.set_commitment(commitment.into());
    }
    Ok(cfg)
}

struct Printer {
    network: SolanaNet,
    json: bool,
}

impl Printer {
    fn print<T: Serialize>(&self, output: &T) -> anyhow::Result<()> {
        let value = serde_json::to_value(output)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        if let serde_json::Value::Object(map) = &value {
            for (key, value) in map {
                match value {
                    serde_json::Value::String(s) => println!("{}: {}", key, s),
                    serde_json::Value::Null => {}
                    value => println!("{}: {}", key, value),
                }
            }
            if let Some(signature) = map
                .get("signature")
                .and_then(|s| s.as_str())
                .and_then(|s| s.parse().ok())
            {
                println!(
                    "Success! Check out your TX here: {}",
                    explorer_tx_url(&signature, self.network)
                );
                println!("{}", solscan_tx_url(&signature, self.network));
            }
        } else {
            println!("{}", value);
        }
        Ok(())
    }
}

async fn run_spl(ctx: &Context, p: &Printer, command: SplCommands) -> anyhow::Result<()> {
    match command {
        SplCommands::Init { decimals, memo } => p.print(
            &spl::create_mint::run(
                ctx,
                spl::create_mint::Input {
                    decimals,
                    mint_authority: None,
                    freeze_authority: None,
                    memo,
                },
            )
            .await?,
        ),
        SplCommands::Metadata {
            mint,
            name,
            symbol,
            uri,
        } => p.print(
            &spl::create_metadata::run(
                ctx,
                spl::create_metadata::Input {
                    mint,
                    name,
                    symbol,
                    uri,
                    seller_fee_basis_points: 0,
                    creators: None,
                    is_mutable: true,
                },
            )
            .await?,
        ),
        SplCommands::Mint {
            mint,
            amount,
            to,
            decimals,
        } => p.print(
            &spl::mint_to::run(
                ctx,
                spl::mint_to::Input {
                    mint,
                    recipient: to,
                    amount,
                    decimals,
                },
            )
            .await?,
        ),
        SplCommands::Transfer {
            mint,
            to,
            amount,
            decimals,
            memo,
            require_funded,
        } => p.print(
            &spl::transfer::run(
                ctx,
                spl::transfer::Input {
                    mint,
                    recipient: to,
                    amount,
                    decimals,
                    memo,
                    allow_unfunded_recipient: !require_funded,
                },
            )
            .await?,
        ),
    }
}

async fn run_nft(ctx: &Context, p: &Printer, command: NftCommands) -> anyhow::Result<()> {
    match command {
        NftCommands::Image { path, no_fund } => p.print(
            &nft::upload_image::run(
                ctx,
                nft::upload_image::Input {
                    path,
                    fund_bundlr: !no_fund,
                },
            )
            .await?,
        ),
        NftCommands::Metadata {
            file,
            image,
            name,
            symbol,
            description,
            image_type,
            seller_fee_basis_points,
            no_fund,
        } => {
            let metadata = match (file, image) {
                (Some(file), _) => {
                    let text = std::fs::read_to_string(&file)
                        .with_context(|| format!("failed to read {}", file.display()))?;
                    serde_json::from_str::<NftMetadata>(&text)?
                }
                (None, Some(image)) => NftMetadata::single_image(
                    name,
                    symbol,
                    description,
                    image,
                    image_type,
                    ctx.payer.pubkey(),
                    seller_fee_basis_points,
                ),
                (None, None) => anyhow::bail!("either --file or --image is required"),
            };
            p.print(
                &nft::upload_metadata::run(
                    ctx,
                    nft::upload_metadata::Input {
                        metadata,
                        fund_bundlr: !no_fund,
                    },
                )
                .await?,
            )
        }
        NftCommands::Mint {
            uri,
            name,
            symbol,
            seller_fee_basis_points,
            immutable,
        } => p.print(
            &nft::mint_nft::run(
                ctx,
                nft::mint_nft::Input {
                    uri,
                    name,
                    symbol,
                    seller_fee_basis_points,
                    is_mutable: !immutable,
                },
            )
            .await?,
        ),
    }
}

async fn run_vault(ctx: &Context, p: &Printer, command: VaultCommands) -> anyhow::Result<()> {
    match command {
        VaultCommands::Initialize { out, force } => p.print(
            &vault::initialize::run(
                ctx,
                vault::initialize::Input {
                    vault_state_path: out,
                    force,
                },
            )
            .await?,
        ),
        VaultCommands::Deposit {
            vault_state,
            amount,
        } => p.print(
            &vault::deposit::run(
                ctx,
                vault::deposit::Input {
                    vault_state: parse_address(&vault_state)?,
                    amount,
                },
            )
            .await?,
        ),
        VaultCommands::Withdraw {
            vault_state,
            amount,
        } => p.print(
            &vault::withdraw::run(
                ctx,
                vault::withdraw::Input {
                    vault_state: parse_address(&vault_state)?,
                    amount,
                },
            )
            .await?,
        ),
        VaultCommands::DepositSpl {
            vault_state,
            mint,
            amount,
            decimals,
        } => p.print(
            &vault::deposit_spl::run(
                ctx,
                vault::deposit_spl::Input {
                    vault_state: parse_address(&vault_state)?,
                    mint,
                    amount,
                    decimals,
                },
            )
            .await?,
        ),
        VaultCommands::WithdrawSpl {
            vault_state,
            mint,
            amount,
            decimals,
        } => p.print(
            &vault::withdraw_spl::run(
                ctx,
                vault::withdraw_spl::Input {
                    vault_state: parse_address(&vault_state)?,
                    mint,
                    amount,
                    decimals,
                },
            )
            .await?,
        ),
        VaultCommands::Show { vault_state } => p.print(
            &vault::show::run(
                ctx,
                vault::show::Input {
                    vault_state: parse_address(&vault_state)?,
                },
            )
            .await?,
        ),
    }
}

async fn run_escrow(ctx: &Context, p: &Printer, command: EscrowCommands) -> anyhow::Result<()> {
    match command {
        EscrowCommands::Make {
            maker_token,
            taker_token,
            deposit_amount,
            offer_amount,
            seed,
        } => p.print(
            &escrow::make::run(
                ctx,
                escrow::make::Input {
                    maker_token,
                    taker_token,
                    seed,
                    deposit_amount,
                    offer_amount,
                },
            )
            .await?,
        ),
        EscrowCommands::Take { escrow: address } => p.print(
            &escrow::take::run(ctx, escrow::take::Input { escrow: address }).await?,
        ),
        EscrowCommands::Refund { escrow: address } => p.print(
            &escrow::refund::run(ctx, escrow::refund::Input { escrow: address }).await?,
        ),
        EscrowCommands::Show { escrow: address } => p.print(
            &escrow::show::run(ctx, escrow::show::Input { escrow: address }).await?,
        ),
    }
}

fn context(cfg: ClientConfig) -> anyhow::Result<Context> {
    let ctx = Context::from_config(cfg)?;
    tracing::debug!("wallet {}", ctx.payer.pubkey());
    Ok(ctx)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let cfg = build_config(&args, &env)?;
    let p = Printer {
        network: cfg.cluster(),
        json: args.json,
    };

    match args.command {
        Commands::Keygen { path, force } => {
            p.print(&generate_keypair::run(generate_keypair::Input { path, force })?)
        }
        Commands::Pda { program_id, seeds } => {
            let seeds = seeds
                .iter()
                .map(|s| find_pda::parse_seed(s))
                .collect::<Result<Vec<_>, _>>()?;
            p.print(&find_pda::run(find_pda::Input { program_id, seeds })?)
        }
        Commands::List => {
            for (name, command) in cmds_solana::command::collect_commands() {
                println!("{:<20} {}", name, command.about);
            }
            Ok(())
        }
        Commands::Airdrop { amount, to } => p.print(
            &request_airdrop::run(
                &context(cfg)?,
                request_airdrop::Input { pubkey: to, amount },
            )
            .await?,
        ),
        Commands::Spl { command } => run_spl(&context(cfg)?, &p, command).await,
        Commands::Nft { command } => run_nft(&context(cfg)?, &p, command).await,
        Commands::Vault { command } => run_vault(&context(cfg)?, &p, command).await,
        Commands::Escrow { command } => run_escrow(&context(cfg)?, &p, command).await,
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Oops, something went wrong: {}", e);
        std::process::exit(1);
    }
}
