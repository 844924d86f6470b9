//! Keypair files in the `solana-keygen` format: a JSON array of the 64
//! secret-key bytes, the ed25519 seed followed by the public key.

use solana_sdk::{
    signature::Keypair,
    signer::{keypair::keypair_from_seed, Signer},
};
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

pub const KEYPAIR_LENGTH: usize = 64;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("invalid keypair file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("keypair must be {KEYPAIR_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),
    #[error("public key does not match secret key")]
    PubkeyMismatch,
}

/// Build a keypair from the 64 raw bytes of a wallet file.
///
/// The signing key is derived from the first 32 bytes and the trailing
/// 32 bytes must be its public key.
pub fn parse_keypair_bytes(bytes: &[u8]) -> Result<Keypair, Error> {
    if bytes.len() != KEYPAIR_LENGTH {
        return Err(Error::InvalidLength(bytes.len()));
    }
    let (seed, public) = bytes.split_at(32);
    let keypair =
        keypair_from_seed(seed).map_err(|error| Error::InvalidSecretKey(error.to_string()))?;
    if keypair.pubkey().as_ref() != public {
        return Err(Error::PubkeyMismatch);
    }
    Ok(keypair)
}

pub fn read_keypair_file(path: impl AsRef<Path>) -> Result<Keypair, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_owned(),
        source,
    })?;
    let bytes: Vec<u8> = serde_json::from_str(&text)?;
    let keypair = parse_keypair_bytes(&bytes)?;
    tracing::debug!("loaded {} from {}", keypair.pubkey(), path.display());
    Ok(keypair)
}

pub fn write_keypair_file(
    keypair: &Keypair,
    path: impl AsRef<Path>,
    overwrite: bool,
) -> Result<(), Error> {
    let path = path.as_ref();
    if !overwrite && path.exists() {
        return Err(Error::AlreadyExists(path.to_owned()));
    }
    let text = serde_json::to_string(&keypair.to_bytes().to_vec())?;
    std::fs::write(path, text).map_err(|source| Error::Write {
        path: path.to_owned(),
        source,
    })
}
