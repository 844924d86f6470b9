use solana_sdk::pubkey::Pubkey;
use std::result::Result as StdResult;
use thiserror::Error as ThisError;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Any(#[from] anyhow::Error),
    #[error("{}", cluster_lib::solana::verbose_solana_error(.0))]
    SolanaClient(#[from] solana_client::client_error::ClientError),
    #[error(transparent)]
    Execute(#[from] cluster_lib::solana::Error),
    #[error(transparent)]
    Wallet(#[from] cluster_lib::wallet::Error),
    #[error(transparent)]
    SolanaProgram(#[from] solana_sdk::program_error::ProgramError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Bundlr(#[from] bundlr_sdk::error::BundlrError),
    #[error("bundlr isn't available on solana {0}")]
    BundlrNotAvailable(cluster_lib::SolanaNet),
    #[error("bundlr api returned an invalid response: {0}")]
    BundlrApiInvalidResponse(String),
    #[error("failed to register funding tx to bundlr. tx_id={0};")]
    BundlrTxRegisterFailed(String),
    #[error("bundlr request timed out")]
    BundlrTimeout,
    #[error("mime type not found")]
    MimeTypeNotFound,
    #[error("solana error: unsupported recipient address: {0}")]
    UnsupportedRecipientAddress(String),
    #[error("solana error: recipient address not funded")]
    RecipientAddressNotFunded,
    #[error("specified account: {0} isn't a token account")]
    NotTokenAccount(Pubkey),
    #[error("account not found: {0}")]
    AccountNotFound(Pubkey),
    #[error("account {0} is not a {1} account")]
    AccountDiscriminatorMismatch(Pubkey, &'static str),
    #[error("insufficient balance, needed={needed}; have={balance};")]
    InsufficientBalance { needed: u64, balance: u64 },
    #[error("amount is negative")]
    NegativeAmount,
    #[error("amount overflow")]
    AmountOverflow,
    #[error("invalid seed {0:?}: {1}")]
    InvalidSeed(String, String),
}

impl Error {
    pub fn custom<E: Into<anyhow::Error>>(e: E) -> Self {
        Error::Any(e.into())
    }
}
