use crate::prelude::*;
use solana_sdk::pubkey::{MAX_SEEDS, MAX_SEED_LEN};
use std::str::FromStr;

const NAME: &str = "find_pda";

inventory::submit!(CommandDescription::new(
    NAME,
    "derive a program address from seeds"
));

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub program_id: Pubkey,
    pub seeds: Vec<Vec<u8>>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub pda: Pubkey,
    pub bump: u8,
}

/// Parse a seed given on the command line.
///
/// - `u64:<n>` and `u8:<n>`: little-endian integer bytes
/// - `hex:<bytes>`: raw bytes
/// - a base58 public key: its 32 bytes
/// - anything else: UTF-8 bytes
pub fn parse_seed(s: &str) -> crate::Result<Vec<u8>> {
    let invalid = |e: &dyn std::fmt::Display| crate::Error::InvalidSeed(s.to_owned(), e.to_string());
    if let Some(n) = s.strip_prefix("u64:") {
        Ok(n.parse::<u64>()
            .map_err(|e| invalid(&e))?
            .to_le_bytes()
            .to_vec())
    } else if let Some(n) = s.strip_prefix("u8:") {
        Ok(vec![n.parse::<u8>().map_err(|e| invalid(&e))?])
    } else if let Some(hex) = s.strip_prefix("hex:") {
        hex::decode(hex).map_err(|e| invalid(&e))
    } else if let Ok(pubkey) = Pubkey::from_str(s) {
        Ok(pubkey.to_bytes().to_vec())
    } else {
        Ok(s.as_bytes().to_vec())
    }
}

pub fn find_pda(program_id: &Pubkey, seeds: &[Vec<u8>]) -> crate::Result<(Pubkey, u8)> {
    if seeds.len() >= MAX_SEEDS {
        return Err(crate::Error::InvalidSeed(
            format!("{} seeds", seeds.len()),
            format!("at most {} seeds", MAX_SEEDS - 1),
        ));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(crate::Error::InvalidSeed(
            format!("{:?}", seed),
            format!("longer than {} bytes", MAX_SEED_LEN),
        ));
    }
    let seeds = seeds.iter().map(|s| &s[..]).collect::<Vec<&[u8]>>();
    Pubkey::try_find_program_address(&seeds, program_id).ok_or_else(|| {
        crate::Error::InvalidSeed(
            format!("{:?}", seeds),
            "unable to find a viable bump".to_owned(),
        )
    })
}

pub fn run(input: Input) -> Result<Output, CommandError> {
    let (pda, bump) = find_pda(&input.program_id, &input.seeds)?;
    Ok(Output { pda, bump })
}
