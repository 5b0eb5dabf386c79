use anyhow::{bail, Context};
use chain_eth::units::{format_gwei, to_base_unit};
use chain_eth::{DisplayAmount, PrivateKey};
use clap::Args;
use eth_rpc::{NodeConfig, RpcProvider, TransferAssembler};

use super::check_chain_id;
use super::query::parse_account;

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Recipient address
    #[arg(long)]
    pub to: String,

    /// Amount in ether, e.g. 0.01
    #[arg(long)]
    pub amount: DisplayAmount,

    /// Sender's hex private key
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,
}

pub async fn run<P: RpcProvider>(
    provider: P,
    config: &NodeConfig,
    args: SendArgs,
) -> anyhow::Result<()> {
    let key = PrivateKey::from_hex(&args.private_key).context("loading PRIVATE_KEY")?;
    parse_account(&args.to).context("--to")?;

    // A signature for the wrong chain id is rejected by the node at best.
    let actual = check_chain_id(&provider, config.chain_id).await?;
    if actual != config.chain_id {
        bail!(
            "refusing to sign for chain {} on a node serving chain {actual}",
            config.chain_id
        );
    }

    let assembler = TransferAssembler::new(provider, config.chain_id);
    let amount = to_base_unit(&args.amount);
    let sent = assembler.transfer(&key, &args.to, amount).await?;

    println!("Transaction hash: {}", sent.tx_hash);
    println!("From:      {}", sent.request.from);
    println!("To:        {}", sent.request.to);
    println!("Amount:    {} ETH", args.amount);
    println!("Nonce:     {}", sent.request.nonce);
    println!("Gas price: {} gwei", format_gwei(&sent.request.gas_price));
    if let Some(url) = config.chain().and_then(|c| c.tx_url(&sent.tx_hash)) {
        println!("Explorer:  {url}");
    }
    Ok(())
}
