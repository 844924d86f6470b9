//! Client for the Mercury escrow program.
//!
//! A maker locks `maker_token` in a program owned vault; a taker pays in
//! `taker_token` and receives the vault content, or the maker takes it back
//! with a refund.

use crate::{prelude::*, utils::build_anchor_instruction};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::system_program;
use spl_associated_token_account::get_associated_token_address;

pub mod make;
pub mod refund;
pub mod show;
pub mod take;

pub const ESCROW_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

pub const ESCROW_ACCOUNT: &str = "Escrow";

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Escrow {
    #[serde_as(as = "DisplayFromStr")]
    pub maker: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub taker: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub maker_token: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub taker_token: Pubkey,
    pub seed: u64,
    pub auth_bump: u8,
    pub vault_bump: u8,
    pub escrow_bump: u8,
}

#[derive(BorshSerialize, Debug, Clone, Copy)]
pub struct MakeArgs {
    pub seed: u64,
    pub deposit_amount: u64,
    pub offer_amount: u64,
}

/// Signs for the vault.
pub fn find_auth() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"auth"], &ESCROW_PROGRAM_ID)
}

pub fn find_escrow(maker: &Pubkey, seed: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[b"escrow", maker.as_ref(), &seed.to_le_bytes()],
        &ESCROW_PROGRAM_ID,
    )
}

pub fn find_vault(escrow: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"vault", escrow.as_ref()], &ESCROW_PROGRAM_ID)
}

pub fn make_instruction(
    maker: &Pubkey,
    maker_token: &Pubkey,
    taker_token: &Pubkey,
    args: MakeArgs,
) -> crate::Result<Instruction> {
    let (auth, _) = find_auth();
    let (escrow, _) = find_escrow(maker, args.seed);
    let (vault, _) = find_vault(&escrow);
    build_anchor_instruction(
        ESCROW_PROGRAM_ID,
        "make",
        vec![
            AccountMeta::new(*maker, true),                                         // maker (writable signer)
            AccountMeta::new(get_associated_token_address(maker, maker_token), false), // maker_ata (writable)
            AccountMeta::new_readonly(*maker_token, false),                         // maker_token
            AccountMeta::new_readonly(*taker_token, false),                         // taker_token
            AccountMeta::new_readonly(auth, false),                                 // auth
            AccountMeta::new(vault, false),                                         // vault (writable)
            AccountMeta::new(escrow, false),                                        // escrow (writable)
            AccountMeta::new_readonly(spl_token::id(), false),                      // token_program
            AccountMeta::new_readonly(system_program::id(), false),                 // system_program
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),   // associated_token_program
        ],
        &args,
    )
}

pub fn take_instruction(
    taker: &Pubkey,
    escrow_address: &Pubkey,
    escrow: &Escrow,
) -> crate::Result<Instruction> {
    let (auth, _) = find_auth();
    let (vault, _) = find_vault(escrow_address);
    build_anchor_instruction(
        ESCROW_PROGRAM_ID,
        "take",
        vec![
            AccountMeta::new(escrow.maker, false), // maker (writable)
            AccountMeta::new(
                get_associated_token_address(&escrow.maker, &escrow.taker_token),
                false,
            ), // maker_receive_ata (writable)
            AccountMeta::new_readonly(escrow.maker_token, false), // maker_token
            AccountMeta::new(*taker, true),                      // taker (writable signer)
            AccountMeta::new(
                get_associated_token_address(taker, &escrow.taker_token),
                false,
            ), // taker_ata (writable)
            AccountMeta::new(
                get_associated_token_address(taker, &escrow.maker_token),
                false,
            ), // taker_receive_ata (writable)
            AccountMeta::new_readonly(escrow.taker_token, false), // taker_token
            AccountMeta::new_readonly(auth, false),               // auth
            AccountMeta::new(vault, false),                       // vault (writable)
            AccountMeta::new(*escrow_address, false),             // escrow (writable)
            AccountMeta::new_readonly(spl_token::id(), false),    // token_program
            AccountMeta::new_readonly(spl_associated_token_account::id(), false), // associated_token_program
            AccountMeta::new_readonly(system_program::id(), false), // system_program
        ],
        &(),
    )
}

pub fn refund_instruction(escrow_address: &Pubkey, escrow: &Escrow) -> crate::Result<Instruction> {
    let (auth, _) = find_auth();
    let (vault, _) = find_vault(escrow_address);
    build_anchor_instruction(
        ESCROW_PROGRAM_ID,
        "refund",
        vec![
            AccountMeta::new(escrow.maker, true), // maker (writable signer)
            AccountMeta::new(
                get_associated_token_address(&escrow.maker, &escrow.maker_token),
                false,
            ), // maker_ata (writable)
            AccountMeta::new_readonly(escrow.maker_token, false), // maker_token
            AccountMeta::new_readonly(auth, false),               // auth
            AccountMeta::new(vault, false),                       // vault (writable)
            AccountMeta::new(*escrow_address, false),             // escrow (writable)
            AccountMeta::new_readonly(spl_token::id(), false),    // token_program
            AccountMeta::new_readonly(system_program::id(), false), // system_program
        ],
        &(),
    )
}
