//! Client for the WBA vault program.
//!
//! Each vault is a `VaultState` account owned by the program, plus two PDAs
//! derived from it: `vault_auth` holds token accounts, `vault` holds lamports.

use crate::{prelude::*, utils::build_anchor_instruction};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::system_program;
use spl_associated_token_account::get_associated_token_address;

pub mod deposit;
pub mod deposit_spl;
pub mod initialize;
pub mod show;
pub mod withdraw;
pub mod withdraw_spl;

pub const VAULT_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("EK5MYUPp2y8KnnhCWBNMGYYkCK1k8sib4WgkWkzE6FD5");

/// Anchor account name of [`VaultState`].
pub const VAULT_STATE_ACCOUNT: &str = "VaultState";

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VaultState {
    #[serde_as(as = "DisplayFromStr")]
    pub owner: Pubkey,
    pub auth_bump: u8,
    pub vault_bump: u8,
    /// Incremented by every deposit and withdrawal.
    pub score: u8,
}

pub fn find_vault_auth(vault_state: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"auth", vault_state.as_ref()], &VAULT_PROGRAM_ID)
}

pub fn find_vault(vault_auth: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"vault", vault_auth.as_ref()], &VAULT_PROGRAM_ID)
}

/// Addresses derived from a vault state account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultAccounts {
    pub vault_state: Pubkey,
    pub vault_auth: Pubkey,
    pub vault: Pubkey,
}

impl VaultAccounts {
    pub fn new(vault_state: Pubkey) -> Self {
        let (vault_auth, _) = find_vault_auth(&vault_state);
        let (vault, _) = find_vault(&vault_auth);
        Self {
            vault_state,
            vault_auth,
            vault,
        }
    }

    /// Associated token account of `vault_auth` for `mint`.
    pub fn vault_ata(&self, mint: &Pubkey) -> Pubkey {
        get_associated_token_address(&self.vault_auth, mint)
    }
}

pub fn initialize_instruction(owner: &Pubkey, accounts: &VaultAccounts) -> crate::Result<Instruction> {
    build_anchor_instruction(
        VAULT_PROGRAM_ID,
        "initialize",
        vec![
            AccountMeta::new(*owner, true),                          // owner (writable signer)
            AccountMeta::new(accounts.vault_state, true),            // vault_state (writable signer)
            AccountMeta::new_readonly(accounts.vault_auth, false),   // vault_auth
            AccountMeta::new(accounts.vault, false),                 // vault (writable)
            AccountMeta::new_readonly(system_program::id(), false),  // system_program
        ],
        &(),
    )
}

/// `deposit` or `withdraw` of lamports between the owner and the vault.
pub fn lamports_instruction(
    name: &str,
    owner: &Pubkey,
    accounts: &VaultAccounts,
    amount: u64,
) -> crate::Result<Instruction> {
    build_anchor_instruction(
        VAULT_PROGRAM_ID,
        name,
        vec![
            AccountMeta::new(*owner, true),                          // owner (writable signer)
            AccountMeta::new(accounts.vault_state, false),           // vault_state (writable)
            AccountMeta::new_readonly(accounts.vault_auth, false),   // vault_auth
            AccountMeta::new(accounts.vault, false),                 // vault (writable)
            AccountMeta::new_readonly(system_program::id(), false),  // system_program
        ],
        &amount,
    )
}

/// `deposit_spl` or `withdraw_spl` between the owner's and the vault's
/// associated token accounts.
pub fn spl_instruction(
    name: &str,
    owner: &Pubkey,
    accounts: &VaultAccounts,
    mint: &Pubkey,
    amount: u64,
) -> crate::Result<Instruction> {
    build_anchor_instruction(
        VAULT_PROGRAM_ID,
        name,
        vec![
            AccountMeta::new(*owner, true),                                      // owner (writable signer)
            AccountMeta::new(get_associated_token_address(owner, mint), false),  // owner_ata (writable)
            AccountMeta::new(accounts.vault_state, false),                       // vault_state (writable)
            AccountMeta::new_readonly(accounts.vault_auth, false),               // vault_auth
            AccountMeta::new(accounts.vault_ata(mint), false),                   // vault_ata (writable)
            AccountMeta::new_readonly(*mint, false),                             // token_mint
            AccountMeta::new_readonly(spl_token::id(), false),                   // token_program
            AccountMeta::new_readonly(system_program::id(), false),              // system_program
            AccountMeta::new_readonly(spl_associated_token_account::id(), false), // associated_token_program
        ],
        &amount,
    )
}
