//! CLI command modules
//!
//! Each subcommand has its own module with argument definitions and handlers.

pub mod chains;
pub mod query;
pub mod send;
pub mod wallet;
pub mod watch;

use std::path::PathBuf;

use anyhow::Context;
use chain_eth::chains::DEFAULT_CHAIN_ID;
use clap::{Args, Parser, Subcommand};
use eth_rpc::{HttpProvider, NodeConfig, RpcProvider};

#[derive(Parser, Debug)]
#[command(name = "ethkit")]
#[command(version, about = "Ethereum wallet, transfer and chain-watching toolkit")]
#[command(after_help = r#"EXAMPLES:
    # Create a new wallet
    ethkit wallet new

    # Check a balance on Sepolia
    ethkit balance 0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf

    # Send 0.01 ETH using PRIVATE_KEY from .env
    ethkit send --to 0x3535353535353535353535353535353535353535 --amount 0.01

    # Follow new blocks on a local node
    ethkit --rpc-url http://127.0.0.1:8545 --chain-id 31337 watch-blocks

ENVIRONMENT VARIABLES:
    ETH_NODE_URL    JSON-RPC endpoint (defaults to the chain's public RPC)
    CHAIN_ID        Chain id (default 11155111, Sepolia)
    PRIVATE_KEY     Hex private key used by `send`
    RUST_LOG        Log filter, overrides -v
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub node: NodeArgs,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Where to find the node.
#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// JSON-RPC endpoint
    #[arg(long, env = "ETH_NODE_URL", global = true)]
    pub rpc_url: Option<String>,

    /// Chain id the node is expected to serve
    #[arg(long, env = "CHAIN_ID", default_value_t = DEFAULT_CHAIN_ID, global = true)]
    pub chain_id: u64,

    /// TOML node configuration; replaces --rpc-url and --chain-id
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

impl NodeArgs {
    pub fn resolve(&self) -> anyhow::Result<NodeConfig> {
        let config = match &self.config {
            Some(path) => NodeConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => NodeConfig::for_chain(self.chain_id, self.rpc_url.as_deref())?,
        };
        Ok(config)
    }

    pub fn connect(&self) -> anyhow::Result<(NodeConfig, HttpProvider)> {
        let config = self.resolve()?;
        tracing::debug!(endpoint = %config.endpoint, chain_id = config.chain_id, "connecting");
        let provider = HttpProvider::new(&config).context("building HTTP client")?;
        Ok((config, provider))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the node's chain id and latest block
    Info,

    /// Show the ether balance of an address
    Balance {
        /// 0x-prefixed address
        address: String,
    },

    /// Create or import a keypair
    Wallet {
        #[command(subcommand)]
        action: wallet::WalletCommands,
    },

    /// Send ether using PRIVATE_KEY
    Send(send::SendArgs),

    /// Show a transaction and its receipt status
    Tx {
        /// 0x-prefixed transaction hash
        hash: String,
    },

    /// Show an ERC-20 token balance
    TokenBalance(query::TokenBalanceArgs),

    /// Print each new block as it is produced
    WatchBlocks(watch::WatchBlocksArgs),

    /// Print ERC-20 Transfer events as they are emitted
    WatchTransfers(watch::WatchTransfersArgs),

    /// List known networks
    Chains {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Wallet { action } => wallet::run(action),
        Commands::Chains { json } => chains::run(json),
        Commands::Info => {
            let (config, provider) = cli.node.connect()?;
            query::info(&provider, &config).await
        }
        Commands::Balance { address } => {
            let (config, provider) = cli.node.connect()?;
            query::balance(&provider, &config, &address).await
        }
        Commands::Tx { hash } => {
            let (config, provider) = cli.node.connect()?;
            query::transaction(&provider, &config, &hash).await
        }
        Commands::TokenBalance(args) => {
            let (_, provider) = cli.node.connect()?;
            query::token_balance(&provider, &args).await
        }
        Commands::Send(args) => {
            let (config, provider) = cli.node.connect()?;
            send::run(provider, &config, args).await
        }
        Commands::WatchBlocks(args) => {
            let (_, provider) = cli.node.connect()?;
            watch::blocks(&provider, &args).await
        }
        Commands::WatchTransfers(args) => {
            let (_, provider) = cli.node.connect()?;
            watch::transfers(&provider, &args).await
        }
    }
}

/// Compares the node's chain id with the configured one. A mismatch is
/// logged, not fatal; `send` treats it as fatal itself.
pub async fn check_chain_id<P: RpcProvider>(provider: &P, expected: u64) -> anyhow::Result<u64> {
    let actual = provider.chain_id().await.context("fetching chain id")?;
    if actual != expected {
        tracing::warn!(expected, actual, "node serves a different chain than configured");
    }
    Ok(actual)
}
