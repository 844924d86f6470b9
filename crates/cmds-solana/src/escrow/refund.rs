use super::{refund_instruction, Escrow, ESCROW_ACCOUNT};
use crate::{prelude::*, utils::fetch_anchor_account};

const NAME: &str = "escrow_refund";

inventory::submit!(CommandDescription::new(
    NAME,
    "close an escrow and return the locked tokens to its maker"
));

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub escrow: Pubkey,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    #[serde_as(as = "DisplayFromStr")]
    pub maker_ata: Pubkey,
}

/// Only the maker can refund, the wallet must be the maker.
pub fn build(ctx: &Context, address: &Pubkey, escrow: &Escrow) -> crate::Result<Instructions> {
    let mut ins = ctx.instructions();
    ins.instructions.push(refund_instruction(address, escrow)?);
    ins.check_signers()?;
    Ok(ins)
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output, CommandError> {
    let escrow: Escrow =
        fetch_anchor_account(&ctx.solana_client, &input.escrow, ESCROW_ACCOUNT).await?;

    let ins = build(ctx, &input.escrow, &escrow)?;
    let signature = ctx.execute(ins).await?;
    tracing::info!("refunded escrow {}", input.escrow);

    Ok(Output {
        signature,
        maker_ata: spl_associated_token_account::get_associated_token_address(
            &escrow.maker,
            &escrow.maker_token,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::find_escrow;
    use cluster_lib::{solana, ClientConfig};

    fn escrow(maker: Pubkey) -> Escrow {
        Escrow {
            maker,
            taker: Pubkey::default(),
            maker_token: Pubkey::new_unique(),
            taker_token: Pubkey::new_unique(),
            seed: 3,
            auth_bump: 255,
            vault_bump: 255,
            escrow_bump: 255,
        }
    }

    #[test]
    fn test_maker_signs() {
        let ctx = Context::with_payer(ClientConfig::default(), Keypair::new());
        let state = escrow(ctx.payer.pubkey());
        let address = find_escrow(&state.maker, state.seed).0;
        let ins = build(&ctx, &address, &state).unwrap();
        assert_eq!(ins.instructions.len(), 1);
    }

    #[test]
    fn test_other_maker_rejected() {
        let ctx = Context::with_payer(ClientConfig::default(), Keypair::new());
        let maker = Pubkey::new_unique();
        let state = escrow(maker);
        let address = find_escrow(&maker, state.seed).0;
        assert!(matches!(
            build(&ctx, &address, &state),
            Err(crate::Error::Execute(solana::Error::MissingSigner(pk))) if pk == maker
        ));
    }
}
