//! SPL token commands.

pub mod associated_token_account;
pub mod create_metadata;
pub mod create_mint;
pub mod mint_to;
pub mod transfer;

pub use associated_token_account::get_or_create_associated_token_account;
