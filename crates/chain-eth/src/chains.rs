use serde::Serialize;

/// Definition of an EVM network reachable through JSON-RPC.
#[derive(Debug, Clone, Serialize)]
pub struct EvmChain {
    pub chain_id: u64,
    pub name: &'static str,
    pub symbol: &'static str,
    /// Public endpoint used when no node URL is configured.
    pub rpc_url: &'static str,
    /// Block explorer base URL, if the network has one.
    pub explorer_url: Option<&'static str>,
    pub is_testnet: bool,
}

impl EvmChain {
    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url.map(|base| format!("{base}/tx/{tx_hash}"))
    }

    /// Explorer link for an account.
    pub fn address_url(&self, address: &str) -> Option<String> {
        self.explorer_url.map(|base| format!("{base}/address/{address}"))
    }
}

/// Ethereum Mainnet (chain ID 1).
pub const ETHEREUM: EvmChain = EvmChain {
    chain_id: 1,
    name: "Ethereum",
    symbol: "ETH",
    rpc_url: "https://cloudflare-eth.com",
    explorer_url: Some("https://etherscan.io"),
    is_testnet: false,
};

/// Sepolia Testnet (chain ID 11155111).
pub const SEPOLIA: EvmChain = EvmChain {
    chain_id: 11155111,
    name: "Sepolia",
    symbol: "ETH",
    rpc_url: "https://rpc.sepolia.org",
    explorer_url: Some("https://sepolia.etherscan.io"),
    is_testnet: true,
};

/// Holesky Testnet (chain ID 17000).
pub const HOLESKY: EvmChain = EvmChain {
    chain_id: 17000,
    name: "Holesky",
    symbol: "ETH",
    rpc_url: "https://ethereum-holesky-rpc.publicnode.com",
    explorer_url: Some("https://holesky.etherscan.io"),
    is_testnet: true,
};

/// Local development node such as anvil or hardhat (chain ID 31337).
pub const LOCAL_DEV: EvmChain = EvmChain {
    chain_id: 31337,
    name: "Local devnet",
    symbol: "ETH",
    rpc_url: "http://127.0.0.1:8545",
    explorer_url: None,
    is_testnet: true,
};

/// Chain assumed when none is configured.
pub const DEFAULT_CHAIN_ID: u64 = SEPOLIA.chain_id;

const ALL_CHAINS: &[&EvmChain] = &[&ETHEREUM, &SEPOLIA, &HOLESKY, &LOCAL_DEV];

/// Returns the chain definition for a given chain ID, or `None` if unknown.
pub fn get_chain(chain_id: u64) -> Option<&'static EvmChain> {
    ALL_CHAINS.iter().find(|c| c.chain_id == chain_id).copied()
}

/// Returns all known chain definitions.
pub fn supported_chains() -> Vec<&'static EvmChain> {
    ALL_CHAINS.to_vec()
}
