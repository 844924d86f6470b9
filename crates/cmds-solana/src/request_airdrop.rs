use crate::{prelude::*, utils::sol_to_lamports};

const NAME: &str = "request_airdrop";

inventory::submit!(CommandDescription::new(NAME, "request an airdrop of SOL"));

fn default_amount() -> Decimal {
    Decimal::ONE
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    /// Defaults to the wallet.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub pubkey: Option<Pubkey>,
    /// Amount in SOL.
    #[serde(default = "default_amount")]
    pub amount: Decimal,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub pubkey: Pubkey,
    /// Lamports after the airdrop.
    pub balance: u64,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let pubkey = input.pubkey.unwrap_or_else(|| ctx.payer.pubkey());
    let lamports = sol_to_lamports(input.amount)?;

    let signature = ctx
        .solana_client
        .request_airdrop(&pubkey, lamports)
        .await
        .map_err(crate::Error::from)?;
    tracing::info!("requested {} lamports for {}: {}", lamports, pubkey, signature);

    ctx.solana_client
        .poll_for_signature_with_commitment(&signature, ctx.cfg.commitment_config())
        .await
        .map_err(crate::Error::from)?;

    let balance = ctx
        .solana_client
        .get_balance(&pubkey)
        .await
        .map_err(crate::Error::from)?;

    Ok(Output {
        signature,
        pubkey,
        balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_lib::ClientConfig;

    #[test]
    fn test_input_defaults() {
        let input: Input = serde_json::from_str("{}").unwrap();
        assert_eq!(input.amount, Decimal::ONE);
        assert!(input.pubkey.is_none());

        let pubkey = Pubkey::new_unique();
        let input: Input = serde_json::from_value(serde_json::json!({
            "pubkey": pubkey.to_string(),
            "amount": "0.2",
        }))
        .unwrap();
        assert_eq!(input.pubkey, Some(pubkey));
        assert_eq!(sol_to_lamports(input.amount).unwrap(), 200_000_000);
    }

    #[tokio::test]
    #[ignore = "requires devnet faucet"]
    async fn test_airdrop_devnet() {
        tracing_subscriber::fmt::try_init().ok();

        let ctx = Context::with_payer(ClientConfig::default(), Keypair::new());
        let output = run(
            &ctx,
            Input {
                pubkey: None,
                amount: Decimal::ONE,
            },
        )
        .await
        .unwrap();
        assert!(!output.signature.to_string().is_empty());
        assert!(output.balance >= 1_000_000_000);
    }
}
