//! Runtime shared by the cluster commands.
//!
//! Table of contents:
//! - [`config`]: network, wallet and execution settings.
//! - [`context`]: services available to a running command.
//! - [`solana`]: building, signing and confirming transactions.
//! - [`wallet`]: reading and writing keypair files.

pub mod config;
pub mod context;
pub mod solana;
pub mod wallet;

pub use config::{ClientConfig, ExecutionConfig, InsertionBehavior, SolanaNet};
pub use context::Context;
