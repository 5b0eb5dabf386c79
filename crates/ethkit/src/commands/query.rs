use std::fmt::Write as _;

use alloy_primitives::{Address, B256};
use anyhow::{bail, Context};
use chain_eth::address::{has_valid_checksum, is_valid_address, parse_address, to_checksum};
use chain_eth::units::{format_gwei, format_units, to_display};
use chain_eth::erc20;
use clap::Args;
use chain_eth::Amount;
use eth_rpc::{NodeConfig, RpcProvider, TransactionInfo, TransactionReceipt};

use super::check_chain_id;

#[derive(Args, Debug)]
pub struct TokenBalanceArgs {
    /// ERC-20 contract address
    #[arg(long)]
    pub token: String,

    /// Account to query
    pub owner: String,

    /// Token decimals; queried from the contract when omitted
    #[arg(long)]
    pub decimals: Option<u8>,
}

/// Parses a user-supplied address, rejecting malformed input before any
/// network call.
pub fn parse_account(s: &str) -> anyhow::Result<Address> {
    if !is_valid_address(s) {
        bail!("invalid address {s:?}: expected 0x followed by 40 hex digits");
    }
    let address = parse_address(s)?;
    if !has_valid_checksum(s) {
        tracing::warn!(
            address = s,
            checksummed = %to_checksum(&address),
            "address does not match its EIP-55 checksum"
        );
    }
    Ok(address)
}

pub fn parse_tx_hash(s: &str) -> anyhow::Result<B256> {
    let digits = s
        .strip_prefix("0x")
        .filter(|d| d.len() == 64 && d.bytes().all(|b| b.is_ascii_hexdigit()));
    match digits {
        Some(digits) => Ok(B256::from_slice(&hex::decode(digits)?)),
        None => bail!("invalid transaction hash {s:?}: expected 0x followed by 64 hex digits"),
    }
}

pub async fn info<P: RpcProvider>(provider: &P, config: &NodeConfig) -> anyhow::Result<()> {
    let chain_id = check_chain_id(provider, config.chain_id).await?;
    let head = provider
        .block_number()
        .await
        .context("fetching latest block")?;

    let name = config.chain().map(|c| c.name).unwrap_or("unknown network");
    println!("Endpoint:     {}", config.endpoint);
    println!("Network:      {name}");
    println!("Chain ID:     {chain_id}");
    println!("Latest block: {head}");
    Ok(())
}

pub async fn balance<P: RpcProvider>(
    provider: &P,
    config: &NodeConfig,
    address: &str,
) -> anyhow::Result<()> {
    let address = parse_account(address)?;
    let wei = provider
        .balance(address)
        .await
        .with_context(|| format!("fetching balance of {address}"))?;

    let symbol = config.chain().map(|c| c.symbol).unwrap_or("ETH");
    println!("{} {symbol}", to_display(&wei));
    tracing::debug!(%address, %wei, "balance in wei");
    Ok(())
}

pub async fn transaction<P: RpcProvider>(
    provider: &P,
    config: &NodeConfig,
    hash: &str,
) -> anyhow::Result<()> {
    let hash = parse_tx_hash(hash)?;
    let Some(tx) = provider
        .transaction_by_hash(hash)
        .await
        .context("fetching transaction")?
    else {
        bail!("transaction {hash} not found");
    };

    let receipt = if tx.is_pending() {
        None
    } else {
        provider
            .transaction_receipt(hash)
            .await
            .context("fetching receipt")?
    };

    print!("{}", describe_transaction(&tx, receipt.as_ref()));
    if let Some(url) = config
        .chain()
        .and_then(|c| c.tx_url(&format!("0x{}", hex::encode(hash))))
    {
        println!("Explorer: {url}");
    }
    Ok(())
}

pub fn describe_transaction(tx: &TransactionInfo, receipt: Option<&TransactionReceipt>) -> String {
    let mut out = String::new();
    let to = tx
        .to
        .map(|a| to_checksum(&a))
        .unwrap_or_else(|| "(contract creation)".into());

    let _ = writeln!(out, "Hash:      0x{}", hex::encode(tx.hash));
    let _ = writeln!(out, "From:      {}", to_checksum(&tx.from));
    let _ = writeln!(out, "To:        {to}");
    let _ = writeln!(out, "Value:     {} ETH", to_display(&tx.value));
    let _ = writeln!(out, "Nonce:     {}", tx.nonce);
    let _ = writeln!(out, "Gas limit: {}", tx.gas);
    if let Some(price) = &tx.gas_price {
        let _ = writeln!(out, "Gas price: {} gwei", format_gwei(price));
    }

    match (tx.block_number, receipt) {
        (None, _) => {
            let _ = writeln!(out, "Status:    pending");
        }
        (Some(block), None) => {
            let _ = writeln!(out, "Block:     {block}");
            let _ = writeln!(out, "Status:    mined (no receipt yet)");
        }
        (Some(block), Some(receipt)) => {
            let status = match receipt.succeeded() {
                Some(true) => "success",
                Some(false) => "failed",
                None => "unknown (pre-Byzantium)",
            };
            let _ = writeln!(out, "Block:     {block}");
            let _ = writeln!(out, "Gas used:  {}", receipt.gas_used);
            let _ = writeln!(out, "Status:    {status}");
        }
    }
    out
}

pub async fn token_balance<P: RpcProvider>(
    provider: &P,
    args: &TokenBalanceArgs,
) -> anyhow::Result<()> {
    let token = parse_account(&args.token).context("--token")?;
    let owner = parse_account(&args.owner)?;

    let holding = fetch_token_balance(provider, token, owner, args.decimals).await?;
    print!("{}", describe_token_balance(&holding));
    tracing::debug!(
        %token,
        %owner,
        raw = %holding.balance,
        decimals = holding.decimals,
        "token balance"
    );
    Ok(())
}

/// An owner's balance of one token, with the metadata used to display it.
#[derive(Debug)]
pub struct TokenHolding {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: u8,
    pub balance: Amount,
}

/// `balanceOf` and `decimals` must succeed; `name` and `symbol` are optional
/// in ERC-20 and only logged when missing.
pub async fn fetch_token_balance<P: RpcProvider>(
    provider: &P,
    token: Address,
    owner: Address,
    decimals: Option<u8>,
) -> anyhow::Result<TokenHolding> {
    let data = provider
        .call(token, erc20::encode_balance_of(owner))
        .await
        .context("calling balanceOf")?;
    let balance = erc20::decode_balance(&data).context("decoding balanceOf result")?;

    let decimals = match decimals {
        Some(decimals) => decimals,
        None => {
            let data = provider
                .call(token, erc20::encode_decimals())
                .await
                .context("calling decimals")?;
            erc20::decode_decimals(&data).context("decoding decimals result")?
        }
    };

    Ok(TokenHolding {
        name: token_text(provider, token, erc20::encode_name(), "name").await,
        symbol: token_text(provider, token, erc20::encode_symbol(), "symbol").await,
        decimals,
        balance,
    })
}

async fn token_text<P: RpcProvider>(
    provider: &P,
    token: Address,
    calldata: Vec<u8>,
    field: &str,
) -> Option<String> {
    let result = provider.call(token, calldata).await;
    match result.map(|data| erc20::decode_text(&data)) {
        Ok(Ok(text)) if !text.is_empty() => Some(text),
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            tracing::warn!(%token, field, error = %e, "token metadata unreadable");
            None
        }
        Err(e) => {
            tracing::warn!(%token, field, error = %e, "token metadata unavailable");
            None
        }
    }
}

pub fn describe_token_balance(holding: &TokenHolding) -> String {
    let mut out = String::new();
    let amount = format_units(&holding.balance, holding.decimals);
    match (&holding.name, &holding.symbol) {
        (Some(name), Some(symbol)) => {
            let _ = writeln!(out, "Token:   {name} ({symbol})");
            let _ = writeln!(out, "Balance: {amount} {symbol}");
        }
        (Some(name), None) => {
            let _ = writeln!(out, "Token:   {name}");
            let _ = writeln!(out, "Balance: {amount}");
        }
        (None, Some(symbol)) => {
            let _ = writeln!(out, "Balance: {amount} {symbol}");
        }
        (None, None) => {
            let _ = writeln!(out, "Balance: {amount}");
        }
    }
    out
}
