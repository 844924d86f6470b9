//! Building, signing, submitting and confirming transactions.

use crate::config::{ExecutionConfig, InsertionBehavior, SolanaNet};
use borsh::BorshDeserialize;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcSendTransactionConfig,
    rpc_request::{RpcError, RpcResponseErrorData},
    rpc_response::RpcSimulateTransactionResult,
};
use solana_sdk::{
    clock::MAX_HASH_AGE_IN_SECONDS,
    commitment_config::{CommitmentConfig, CommitmentLevel},
    compute_budget::{self, ComputeBudgetInstruction},
    hash::Hash,
    instruction::Instruction,
    message::{v0, CompileError, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::{Signer, SignerError},
    transaction::VersionedTransaction,
};
use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};
use thiserror::Error as ThisError;

pub const MAX_COMPUTE_UNITS: u64 = 1_400_000;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("missing signature for {0}")]
    MissingSigner(Pubkey),
    #[error("transaction has no instructions")]
    NoInstructions,
    #[error(transparent)]
    CompileError(#[from] CompileError),
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error("{}", display_solana_error(.error, .inserted))]
    Solana {
        error: Box<ClientError>,
        /// Number of instructions inserted before the caller's instructions.
        inserted: usize,
    },
}

impl Error {
    pub fn solana(error: ClientError, inserted: usize) -> Self {
        Self::Solana {
            error: Box::new(error),
            inserted,
        }
    }
}

impl From<ClientError> for Error {
    fn from(error: ClientError) -> Self {
        Self::solana(error, 0)
    }
}

fn display_solana_error(error: &ClientError, inserted: &usize) -> String {
    let msg = verbose_solana_error(error);
    match find_failed_instruction(error) {
        Some(index) if index >= *inserted => {
            format!("instruction #{} failed: {}", index - inserted, msg)
        }
        _ => msg,
    }
}

pub fn find_failed_instruction(err: &ClientError) -> Option<usize> {
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError { message, .. }) = &err.kind {
        if let Some(s) =
            message.strip_prefix("Transaction simulation failed: Error processing Instruction ")
        {
            let index = s
                .chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>();
            index.parse().ok()
        } else {
            None
        }
    } else {
        None
    }
}

pub fn verbose_solana_error(err: &ClientError) -> String {
    use std::fmt::Write;
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError {
        code,
        message,
        data,
    }) = &err.kind
    {
        let mut s = String::new();
        writeln!(s, "{} ({})", message, code).ok();
        if let RpcResponseErrorData::SendTransactionPreflightFailure(
            RpcSimulateTransactionResult {
                logs: Some(logs), ..
            },
        ) = data
        {
            for (i, log) in logs.iter().enumerate() {
                writeln!(s, "{}: {}", i + 1, log).ok();
            }
        }
        s
    } else {
        err.to_string()
    }
}

pub trait KeypairExt {
    fn clone_keypair(&self) -> Self;
}

impl KeypairExt for Keypair {
    fn clone_keypair(&self) -> Self {
        self.insecure_clone()
    }
}

/// Instructions to submit in one transaction.
#[derive(Default, Debug)]
pub struct Instructions {
    pub fee_payer: Pubkey,
    pub signers: Vec<Keypair>,
    pub instructions: Vec<Instruction>,
}

impl Instructions {
    pub fn new(fee_payer: &Keypair) -> Self {
        Self {
            fee_payer: fee_payer.pubkey(),
            signers: [fee_payer.clone_keypair()].into(),
            instructions: Vec::new(),
        }
    }

    pub fn push_signer(&mut self, signer: &Keypair) {
        if !self.signers.iter().any(|s| s.pubkey() == signer.pubkey()) {
            self.signers.push(signer.clone_keypair());
        }
    }

    pub fn combine(&mut self, next: Self) -> Result<(), Self> {
        if next.fee_payer != self.fee_payer {
            return Err(next);
        }

        for signer in next.signers {
            if !self.signers.iter().any(|s| s.pubkey() == signer.pubkey()) {
                self.signers.push(signer);
            }
        }

        self.instructions.extend(next.instructions);

        Ok(())
    }

    /// Fee payer followed by every account marked as signer, deduplicated.
    pub fn required_signers(&self) -> Vec<Pubkey> {
        let mut seen = BTreeSet::new();
        std::iter::once(self.fee_payer)
            .chain(
                self.instructions
                    .iter()
                    .flat_map(|i| i.accounts.iter().filter(|a| a.is_signer).map(|a| a.pubkey)),
            )
            .filter(|pk| seen.insert(*pk))
            .collect()
    }

    /// Fail if a required signature has no keypair.
    pub fn check_signers(&self) -> Result<(), Error> {
        if self.instructions.is_empty() {
            return Err(Error::NoInstructions);
        }
        for pubkey in self.required_signers() {
            if !self.signers.iter().any(|s| s.pubkey() == pubkey) {
                return Err(Error::MissingSigner(pubkey));
            }
        }
        Ok(())
    }

    pub async fn execute(
        mut self,
        rpc: &RpcClient,
        config: &ExecutionConfig,
    ) -> Result<Signature, Error> {
        self.check_signers()?;

        let inserted = insert_compute_budget(&mut self, rpc, config).await?;
        let tx = build_and_sign_tx(&self, rpc, config.tx_commitment_level).await?;

        let signature = rpc
            .send_transaction_with_config(
                &tx,
                RpcSendTransactionConfig {
                    preflight_commitment: Some(config.simulation_commitment_level),
                    ..<_>::default()
                },
            )
            .await
            .map_err(move |error| Error::solana(error, inserted))?;
        tracing::info!("submitted {}", signature);

        confirm_transaction(
            rpc,
            &signature,
            tx.message.recent_blockhash(),
            commitment(config.wait_commitment_level),
        )
        .await
        .map_err(move |error| Error::solana(error, inserted))?;
        tracing::info!("confirmed {}", signature);

        Ok(signature)
    }
}

fn commitment(commitment: CommitmentLevel) -> CommitmentConfig {
    CommitmentConfig { commitment }
}

fn is_compute_budget_instruction(
    ix: &Instruction,
    f: fn(&ComputeBudgetInstruction) -> bool,
) -> bool {
    compute_budget::check_id(&ix.program_id)
        && ComputeBudgetInstruction::try_from_slice(&ix.data)
            .map_err(|error| tracing::error!("could not decode instruction: {}", error))
            .is_ok_and(|data| f(&data))
}

fn contains_set_compute_unit_limit(i: &Instructions) -> bool {
    i.instructions.iter().any(|ix| {
        is_compute_budget_instruction(ix, |data| {
            matches!(data, ComputeBudgetInstruction::SetComputeUnitLimit(_))
        })
    })
}

fn contains_set_compute_unit_price(i: &Instructions) -> bool {
    i.instructions.iter().any(|ix| {
        is_compute_budget_instruction(ix, |data| {
            matches!(data, ComputeBudgetInstruction::SetComputeUnitPrice(_))
        })
    })
}

/// Units to request given what a simulation consumed.
pub fn compute_units_with_margin(consumed: u64) -> u64 {
    (1000 + consumed * 3 / 2).min(MAX_COMPUTE_UNITS)
}

async fn simulate_compute_units(
    i: &Instructions,
    rpc: &RpcClient,
    config: &ExecutionConfig,
) -> Result<Option<u64>, Error> {
    let message = build_message(i, rpc, config.simulation_commitment_level).await?;
    let tx = VersionedTransaction {
        signatures: vec![Signature::default(); message.header.num_required_signatures as usize],
        message: VersionedMessage::V0(message),
    };
    let consumed = match rpc.simulate_transaction(&tx).await {
        Err(error) => {
            tracing::warn!("simulation failed: {}", error);
            None
        }
        Ok(result) => {
            if let Some(error) = result.value.err {
                tracing::warn!("simulation error: {}", error);
                for log in result.value.logs.unwrap_or_default() {
                    tracing::info!("{}", log);
                }
            } else {
                for log in result.value.logs.unwrap_or_default() {
                    tracing::debug!("{}", log);
                }
            }
            result.value.units_consumed.filter(|x| *x > 0)
        }
    };
    Ok(consumed.map(compute_units_with_margin))
}

/// Insert compute-budget instructions at the front, returns how many were added.
async fn insert_compute_budget(
    i: &mut Instructions,
    rpc: &RpcClient,
    config: &ExecutionConfig,
) -> Result<usize, Error> {
    let count = i.instructions.len() as u64;
    let mut inserted = 0;

    if config.compute_budget != InsertionBehavior::No && !contains_set_compute_unit_limit(i) {
        let compute_units = match config.compute_budget {
            InsertionBehavior::Value(x) => x,
            _ => simulate_compute_units(i, rpc, config)
                .await?
                .or(config.fallback_compute_budget)
                .unwrap_or(200_000 * count),
        }
        .min(MAX_COMPUTE_UNITS) as u32;
        tracing::info!("setting compute unit limit {}", compute_units);
        i.instructions.insert(
            0,
            ComputeBudgetInstruction::set_compute_unit_limit(compute_units),
        );
        inserted += 1;
    }

    if let InsertionBehavior::Value(fee) = config.priority_fee {
        if !contains_set_compute_unit_price(i) {
            tracing::info!("adding priority fee {}", fee);
            i.instructions
                .insert(0, ComputeBudgetInstruction::set_compute_unit_price(fee));
            inserted += 1;
        }
    } else if config.priority_fee == InsertionBehavior::Auto {
        tracing::warn!("no priority fee estimator available, skipping");
    }

    Ok(inserted)
}

async fn build_message(
    i: &Instructions,
    rpc: &RpcClient,
    commitment_level: CommitmentLevel,
) -> Result<v0::Message, Error> {
    let blockhash = rpc
        .get_latest_blockhash_with_commitment(commitment(commitment_level))
        .await?
        .0;
    Ok(build_message_with_blockhash(i, blockhash)?)
}

pub fn build_message_with_blockhash(
    i: &Instructions,
    blockhash: Hash,
) -> Result<v0::Message, CompileError> {
    v0::Message::try_compile(&i.fee_payer, &i.instructions, &[], blockhash)
}

/// Sign with exactly the keypairs the message requires.
pub fn sign_message(i: &Instructions, message: v0::Message) -> Result<VersionedTransaction, Error> {
    let required = &message.account_keys[..message.header.num_required_signatures as usize];
    let mut signers = Vec::<&dyn Signer>::with_capacity(required.len());
    for pubkey in required {
        let keypair = i
            .signers
            .iter()
            .find(|k| k.pubkey() == *pubkey)
            .ok_or(Error::MissingSigner(*pubkey))?;
        signers.push(keypair);
    }
    Ok(VersionedTransaction::try_new(
        VersionedMessage::V0(message),
        &signers,
    )?)
}

async fn build_and_sign_tx(
    i: &Instructions,
    rpc: &RpcClient,
    commitment_level: CommitmentLevel,
) -> Result<VersionedTransaction, Error> {
    let message = build_message(i, rpc, commitment_level).await?;
    sign_message(i, message)
}

// https://docs.rs/solana-rpc-client/2.0.3/src/solana_rpc_client/nonblocking/rpc_client.rs.html#1059-1064
// removed progress bar
pub async fn confirm_transaction(
    rpc: &RpcClient,
    signature: &Signature,
    recent_blockhash: &Hash,
    commitment: CommitmentConfig,
) -> Result<(), ClientError> {
    let status = loop {
        let status = rpc
            .get_signature_status_with_commitment(signature, CommitmentConfig::processed())
            .await?;
        if status.is_some() {
            break status;
        }
        let blockhash_not_found = !rpc
            .is_blockhash_valid(recent_blockhash, CommitmentConfig::processed())
            .await?;
        if blockhash_not_found {
            break status;
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
    };
    match status {
        Some(Err(err)) => return Err(err.into()),
        Some(Ok(())) => {}
        None => {
            return Err(RpcError::ForUser(
                "unable to confirm transaction. \
                 This can happen in situations such as transaction expiration \
                 and insufficient fee-payer funds"
                    .to_string(),
            )
            .into())
        }
    }
    let now = Instant::now();
    loop {
        // failed transactions were returned above
        if rpc
            .get_signature_status_with_commitment(signature, commitment)
            .await?
            .is_some()
        {
            return Ok(());
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
        if now.elapsed().as_secs() >= MAX_HASH_AGE_IN_SECONDS as u64 {
            return Err(RpcError::ForUser(
                "transaction not finalized. \
                 This can happen when a transaction lands in an abandoned fork. \
                 Please retry."
                    .to_string(),
            )
            .into());
        }
    }
}

pub fn explorer_tx_url(signature: &Signature, network: SolanaNet) -> String {
    format!(
        "https://explorer.solana.com/tx/{}{}",
        signature,
        network.explorer_query()
    )
}

pub fn explorer_address_url(address: &Pubkey, network: SolanaNet) -> String {
    format!(
        "https://explorer.solana.com/address/{}{}",
        address,
        network.explorer_query()
    )
}

pub fn solscan_tx_url(signature: &Signature, network: SolanaNet) -> String {
    format!(
        "https://solscan.io/tx/{}{}",
        signature,
        network.explorer_query()
    )
}

pub fn solscan_token_url(mint: &Pubkey, network: SolanaNet) -> String {
    format!(
        "https://solscan.io/token/{}{}#metadata",
        mint,
        network.explorer_query()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{instruction::AccountMeta, system_instruction::transfer};

    #[test]
    fn test_missing_signer_rejected() {
        let payer = Keypair::new();
        let other = Pubkey::new_unique();
        let mut ins = Instructions::new(&payer);
        ins.instructions
            .push(transfer(&other, &Pubkey::new_unique(), 1000));
        assert!(matches!(
            ins.check_signers(),
            Err(Error::MissingSigner(pk)) if pk == other
        ));
    }

    #[test]
    fn test_empty_rejected() {
        let payer = Keypair::new();
        assert!(matches!(
            Instructions::new(&payer).check_signers(),
            Err(Error::NoInstructions)
        ));
    }

    #[test]
    fn test_required_signers() {
        let payer = Keypair::new();
        let extra = Keypair::new();
        let mut ins = Instructions::new(&payer);
        ins.instructions.push(Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![
                AccountMeta::new(payer.pubkey(), true),
                AccountMeta::new(extra.pubkey(), true),
                AccountMeta::new_readonly(Pubkey::new_unique(), false),
            ],
            data: vec![],
        });
        assert_eq!(
            ins.required_signers(),
            vec![payer.pubkey(), extra.pubkey()]
        );
        assert!(ins.check_signers().is_err());
        ins.push_signer(&extra);
        ins.push_signer(&extra);
        assert_eq!(ins.signers.len(), 2);
        ins.check_signers().unwrap();
    }

    #[test]
    fn test_sign_offline() {
        let payer = Keypair::new();
        let to = Pubkey::new_unique();
        let mut ins = Instructions::new(&payer);
        ins.instructions.push(transfer(&payer.pubkey(), &to, 1000));
        // unrelated signer must not end up in the transaction
        ins.push_signer(&Keypair::new());

        let message = build_message_with_blockhash(&ins, Hash::new_unique()).unwrap();
        let tx = sign_message(&ins, message).unwrap();
        assert_eq!(tx.signatures.len(), 1);
        assert_ne!(tx.signatures[0], Signature::default());
        assert!(tx.verify_with_results().into_iter().all(|ok| ok));
    }

    #[test]
    fn test_combine() {
        let payer = Keypair::new();
        let mut a = Instructions::new(&payer);
        a.instructions
            .push(transfer(&payer.pubkey(), &Pubkey::new_unique(), 1));
        let mut b = Instructions::new(&payer);
        b.instructions
            .push(transfer(&payer.pubkey(), &Pubkey::new_unique(), 2));
        a.combine(b).unwrap();
        assert_eq!(a.instructions.len(), 2);
        assert_eq!(a.signers.len(), 1);

        let c = Instructions::new(&Keypair::new());
        assert!(a.combine(c).is_err());
    }

    #[test]
    fn test_compute_units_with_margin() {
        assert_eq!(compute_units_with_margin(10_000), 16_000);
        assert_eq!(compute_units_with_margin(2_000_000), MAX_COMPUTE_UNITS);
    }

    #[test]
    fn test_explorer_urls() {
        let sig = Signature::default();
        assert_eq!(
            explorer_tx_url(&sig, SolanaNet::Devnet),
            format!("https://explorer.solana.com/tx/{}?cluster=devnet", sig)
        );
        let mint = Pubkey::new_unique();
        assert_eq!(
            solscan_token_url(&mint, SolanaNet::Devnet),
            format!("https://solscan.io/token/{}?cluster=devnet#metadata", mint)
        );
        assert_eq!(
            solscan_tx_url(&sig, SolanaNet::Mainnet),
            format!("https://solscan.io/tx/{}", sig)
        );
    }

    #[tokio::test]
    #[ignore = "requires a funded devnet wallet at wba-wallet.json"]
    async fn test_execute_devnet() {
        tracing_subscriber::fmt::try_init().ok();

        let payer = crate::wallet::read_keypair_file(crate::config::DEFAULT_WALLET_PATH).unwrap();
        let rpc = RpcClient::new(SolanaNet::Devnet.url());
        let mut ins = Instructions::new(&payer);
        ins.instructions
            .push(transfer(&payer.pubkey(), &Pubkey::new_unique(), 1_000_000));
        let signature = ins
            .execute(&rpc, &ExecutionConfig::default())
            .await
            .unwrap();
        assert_ne!(signature, Signature::default());
        assert!(!signature.to_string().is_empty());
    }
}
