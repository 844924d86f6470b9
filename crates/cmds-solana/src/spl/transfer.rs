use super::associated_token_account::create_instruction_if_needed;
use crate::{prelude::*, utils::ui_amount_to_amount};
use solana_sdk::{account::Account, program_pack::Pack};
use spl_associated_token_account::get_associated_token_address;
use spl_token::{
    instruction::transfer_checked,
    state::{Account as TokenAccount, Mint},
};

const NAME: &str = "transfer_token";

inventory::submit!(CommandDescription::new(
    NAME,
    "transfer SPL tokens between associated token accounts"
));

fn default_true() -> bool {
    true
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    /// Wallet or token account receiving the tokens.
    #[serde_as(as = "DisplayFromStr")]
    pub recipient: Pubkey,
    /// Amount in UI units.
    pub amount: Decimal,
    pub decimals: Option<u8>,
    #[serde(default)]
    pub memo: String,
    #[serde(default = "default_true")]
    pub allow_unfunded_recipient: bool,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub recipient_token_account: Pubkey,
}

/// Accounts read from the cluster before building a transfer, `None` when
/// an account doesn't exist.
#[derive(Debug, Default, Clone)]
pub struct TransferAccounts {
    pub mint: Option<Account>,
    /// Sender associated token account.
    pub sender: Option<Account>,
    pub recipient: Option<Account>,
    /// Associated token account of `recipient`.
    pub recipient_ata: Option<Account>,
}

impl TransferAccounts {
    pub async fn fetch(
        client: &RpcClient,
        owner: &Pubkey,
        mint: &Pubkey,
        recipient: &Pubkey,
    ) -> crate::Result<Self> {
        let keys = [
            *mint,
            get_associated_token_address(owner, mint),
            *recipient,
            get_associated_token_address(recipient, mint),
        ];
        let mut accounts = client
            .get_multiple_accounts_with_commitment(&keys, client.commitment())
            .await?
            .value
            .into_iter();
        Ok(Self {
            mint: accounts.next().flatten(),
            sender: accounts.next().flatten(),
            recipient: accounts.next().flatten(),
            recipient_ata: accounts.next().flatten(),
        })
    }
}

fn is_token_account(account: &Account) -> bool {
    account.owner == spl_token::id() && account.data.len() == TokenAccount::LEN
}

/// Balance of an existing token account.
fn token_balance(address: Pubkey, account: &Account) -> crate::Result<u64> {
    if !is_token_account(account) {
        return Err(crate::Error::NotTokenAccount(address));
    }
    let state =
        TokenAccount::unpack(&account.data).map_err(|_| crate::Error::NotTokenAccount(address))?;
    Ok(state.amount)
}

// https://spl.solana.com/associated-token-account
#[allow(clippy::too_many_arguments)]
pub fn transfer_token_instructions(
    owner: &Pubkey,
    mint: Pubkey,
    ui_amount: Decimal,
    decimals: Option<u8>,
    recipient: Pubkey,
    allow_unfunded_recipient: bool,
    memo: &str,
    accounts: &TransferAccounts,
) -> crate::Result<(Vec<Instruction>, Pubkey)> {
    let decimals = match decimals {
        Some(d) => d,
        None => {
            let account = accounts
                .mint
                .as_ref()
                .ok_or(crate::Error::AccountNotFound(mint))?;
            Mint::unpack(&account.data)?.decimals
        }
    };
    let transfer_balance = ui_amount_to_amount(ui_amount, decimals)?;

    let mut instructions = vec![];

    let sender = get_associated_token_address(owner, &mint);
    let sender_balance = match &accounts.sender {
        Some(account) => token_balance(sender, account)?,
        None => {
            instructions.extend(create_instruction_if_needed(owner, owner, &mint, &sender, None)?);
            0
        }
    };
    if transfer_balance > sender_balance {
        return Err(crate::Error::InsufficientBalance {
            needed: transfer_balance,
            balance: sender_balance,
        });
    }

    if accounts.recipient.is_none() && !allow_unfunded_recipient {
        return Err(crate::Error::RecipientAddressNotFunded);
    }
    let recipient_token_account = if accounts.recipient.as_ref().is_some_and(is_token_account) {
        recipient
    } else {
        let address = get_associated_token_address(&recipient, &mint);
        instructions.extend(create_instruction_if_needed(
            owner,
            &recipient,
            &mint,
            &address,
            accounts.recipient_ata.as_ref().map(|a| a.owner),
        )?);
        address
    };

    instructions.push(transfer_checked(
        &spl_token::id(),
        &sender,
        &mint,
        &recipient_token_account,
        owner,
        &[],
        transfer_balance,
        decimals,
    )?);

    if !memo.is_empty() {
        instructions.push(spl_memo::build_memo(memo.as_bytes(), &[owner]));
    }

    Ok((instructions, recipient_token_account))
}

#[allow(clippy::too_many_arguments)]
pub async fn command_transfer_token(
    client: &RpcClient,
    owner: &Pubkey,
    mint: Pubkey,
    ui_amount: Decimal,
    decimals: Option<u8>,
    recipient: Pubkey,
    allow_unfunded_recipient: bool,
    memo: &str,
) -> crate::Result<(Vec<Instruction>, Pubkey)> {
    let accounts = TransferAccounts::fetch(client, owner, &mint, &recipient).await?;
    transfer_token_instructions(
        owner,
        mint,
        ui_amount,
        decimals,
        recipient,
        allow_unfunded_recipient,
        memo,
        &accounts,
    )
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let (instructions, recipient_token_account) = command_transfer_token(
        &ctx.solana_client,
        &ctx.payer.pubkey(),
        input.mint,
        input.amount,
        input.decimals,
        input.recipient,
        input.allow_unfunded_recipient,
        &input.memo,
    )
    .await?;

    let mut ins = ctx.instructions();
    ins.instructions = instructions;
    let signature = ctx.execute(ins).await?;
    tracing::info!(
        "transferred {} of {} to {}",
        input.amount,
        input.mint,
        recipient_token_account
    );

    Ok(Output {
        signature,
        recipient_token_account,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_lib::{wallet, ClientConfig};
    use spl_token::{instruction::TokenInstruction, state::AccountState};

    fn mint_account(decimals: u8) -> Account {
        let mut data = vec![0; Mint::LEN];
        Mint {
            decimals,
            is_initialized: true,
            ..Default::default()
        }
        .pack_into_slice(&mut data);
        Account {
            lamports: 1_461_600,
            data,
            owner: spl_token::id(),
            executable: false,
            rent_epoch: 0,
        }
    }

    fn token_account(mint: Pubkey, owner: Pubkey, amount: u64) -> Account {
        let mut data = vec![0; TokenAccount::LEN];
        TokenAccount {
            mint,
            owner,
            amount,
            state: AccountState::Initialized,
            ..Default::default()
        }
        .pack_into_slice(&mut data);
        Account {
            lamports: 2_039_280,
            data,
            owner: spl_token::id(),
            executable: false,
            rent_epoch: 0,
        }
    }

    fn wallet_account() -> Account {
        Account {
            lamports: 1_000_000_000,
            data: vec![],
            owner: solana_program::system_program::id(),
            executable: false,
            rent_epoch: 0,
        }
    }

    fn transfer_amount(ix: &Instruction) -> (u64, u8) {
        match TokenInstruction::unpack(&ix.data).unwrap() {
            TokenInstruction::TransferChecked { amount, decimals } => (amount, decimals),
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    struct Case {
        owner: Pubkey,
        mint: Pubkey,
        recipient: Pubkey,
        accounts: TransferAccounts,
    }

    /// Sender holds `balance` raw units of a 6 decimals mint. The recipient is
    /// a funded wallet without an ATA.
    fn case(balance: u64) -> Case {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        Case {
            owner,
            mint,
            recipient: Pubkey::new_unique(),
            accounts: TransferAccounts {
                mint: Some(mint_account(6)),
                sender: Some(token_account(mint, owner, balance)),
                recipient: Some(wallet_account()),
                recipient_ata: None,
            },
        }
    }

    fn build(
        c: &Case,
        ui_amount: &str,
        decimals: Option<u8>,
        allow_unfunded: bool,
    ) -> crate::Result<(Vec<Instruction>, Pubkey)> {
        transfer_token_instructions(
            &c.owner,
            c.mint,
            ui_amount.parse().unwrap(),
            decimals,
            c.recipient,
            allow_unfunded,
            "",
            &c.accounts,
        )
    }

    #[test]
    fn test_creates_recipient_ata() {
        let c = case(5_000_000);
        let (ixs, destination) = build(&c, "1.5", None, true).unwrap();
        assert_eq!(destination, get_associated_token_address(&c.recipient, &c.mint));
        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[0].program_id, spl_associated_token_account::id());
        assert_eq!(ixs[0].accounts[1].pubkey, destination);
        assert_eq!(ixs[1].program_id, spl_token::id());
        assert_eq!(
            ixs[1].accounts[0].pubkey,
            get_associated_token_address(&c.owner, &c.mint)
        );
        assert_eq!(ixs[1].accounts[2].pubkey, destination);
        assert_eq!(transfer_amount(&ixs[1]), (1_500_000, 6));
    }

    #[test]
    fn test_existing_recipient_ata_and_memo() {
        let mut c = case(5_000_000);
        c.accounts.recipient_ata = Some(token_account(c.mint, c.recipient, 0));
        let (ixs, _) = transfer_token_instructions(
            &c.owner,
            c.mint,
            Decimal::ONE,
            Some(6),
            c.recipient,
            true,
            "gm",
            &c.accounts,
        )
        .unwrap();
        assert_eq!(ixs.len(), 2);
        assert_eq!(transfer_amount(&ixs[0]), (1_000_000, 6));
        assert_eq!(ixs[1].program_id, spl_memo::id());
        assert_eq!(ixs[1].data, b"gm");
    }

    #[test]
    fn test_insufficient_balance() {
        let c = case(999_999);
        assert!(matches!(
            build(&c, "1", None, true),
            Err(crate::Error::InsufficientBalance {
                needed: 1_000_000,
                balance: 999_999
            })
        ));
    }

    #[test]
    fn test_unfunded_recipient() {
        let mut c = case(5_000_000);
        c.accounts.recipient = None;
        assert!(matches!(
            build(&c, "1", None, false),
            Err(crate::Error::RecipientAddressNotFunded)
        ));

        let (ixs, destination) = build(&c, "1", None, true).unwrap();
        assert_eq!(destination, get_associated_token_address(&c.recipient, &c.mint));
        assert_eq!(ixs.len(), 2);
    }

    #[test]
    fn test_token_account_recipient_used_directly() {
        let mut c = case(5_000_000);
        c.accounts.recipient = Some(token_account(c.mint, Pubkey::new_unique(), 0));
        let (ixs, destination) = build(&c, "1", None, false).unwrap();
        assert_eq!(destination, c.recipient);
        assert_eq!(ixs.len(), 1);
        assert_eq!(ixs[0].accounts[2].pubkey, c.recipient);
    }

    #[test]
    fn test_foreign_recipient_ata() {
        let mut c = case(5_000_000);
        c.accounts.recipient_ata = Some(Account {
            owner: Pubkey::new_unique(),
            ..wallet_account()
        });
        assert!(matches!(
            build(&c, "1", None, true),
            Err(crate::Error::UnsupportedRecipientAddress(_))
        ));
    }

    #[test]
    fn test_missing_sender_ata() {
        let mut c = case(0);
        c.accounts.sender = None;
        let sender = get_associated_token_address(&c.owner, &c.mint);

        let (ixs, _) = build(&c, "0", None, true).unwrap();
        assert_eq!(ixs.len(), 3);
        assert_eq!(ixs[0].program_id, spl_associated_token_account::id());
        assert_eq!(ixs[0].accounts[1].pubkey, sender);
        assert_eq!(ixs[0].accounts[2].pubkey, c.owner);

        assert!(matches!(
            build(&c, "1", None, true),
            Err(crate::Error::InsufficientBalance { balance: 0, .. })
        ));
    }

    #[test]
    fn test_sender_not_token_account() {
        let mut c = case(0);
        c.accounts.sender = Some(wallet_account());
        let sender = get_associated_token_address(&c.owner, &c.mint);
        assert!(matches!(
            build(&c, "1", None, true),
            Err(crate::Error::NotTokenAccount(pk)) if pk == sender
        ));
    }

    #[test]
    fn test_decimals() {
        let mut c = case(u64::MAX);
        assert!(matches!(
            build(&c, "1", Some(30), true),
            Err(crate::Error::AmountOverflow)
        ));

        c.accounts.mint = None;
        assert!(matches!(
            build(&c, "1", None, true),
            Err(crate::Error::AccountNotFound(pk)) if pk == c.mint
        ));
        let (ixs, _) = build(&c, "1", Some(2), true).unwrap();
        assert_eq!(transfer_amount(&ixs[1]), (100, 2));
    }

    #[test]
    fn test_input() {
        let input: Input = serde_json::from_value(serde_json::json!({
            "mint": "FNR7QBxNNJC9TSCv4WunRf1m4cfW32Uvm71GDeNYYmRm",
            "recipient": "tiosTcRdt9TW7baDB3BLL3LY16w5pP5XsTbeQNZJKjD",
            "amount": "1000",
        }))
        .unwrap();
        assert_eq!(
            input.mint,
            solana_sdk::pubkey!("FNR7QBxNNJC9TSCv4WunRf1m4cfW32Uvm71GDeNYYmRm")
        );
        assert_eq!(ui_amount_to_amount(input.amount, 6).unwrap(), 1_000_000_000);
        assert!(input.allow_unfunded_recipient);
        assert!(input.memo.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a devnet wallet holding the mint"]
    async fn test_transfer_devnet() {
        tracing_subscriber::fmt::try_init().ok();

        let payer = wallet::read_keypair_file("wba-wallet.json").unwrap();
        let ctx = Context::with_payer(ClientConfig::default(), payer);
        let output = run(
            &ctx,
            Input {
                mint: solana_sdk::pubkey!("FNR7QBxNNJC9TSCv4WunRf1m4cfW32Uvm71GDeNYYmRm"),
                recipient: solana_sdk::pubkey!("tiosTcRdt9TW7baDB3BLL3LY16w5pP5XsTbeQNZJKjD"),
                amount: Decimal::from(1000),
                decimals: None,
                memo: String::new(),
                allow_unfunded_recipient: true,
            },
        )
        .await
        .unwrap();
        assert!(!output.signature.to_string().is_empty());
    }
}
