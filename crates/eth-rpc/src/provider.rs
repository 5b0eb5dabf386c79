use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use chain_eth::Amount;

use crate::error::ProviderError;
use crate::types::{Block, Log, LogFilter, TransactionInfo, TransactionReceipt};

/// Read and broadcast access to an Ethereum node.
///
/// Implementations must be safe to share across tasks; one provider is
/// typically cloned into every command and polling loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcProvider: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// `eth_blockNumber`: the current head.
    async fn block_number(&self) -> Result<u64, ProviderError>;

    /// `eth_getBalance` at `latest`.
    async fn balance(&self, address: Address) -> Result<Amount, ProviderError>;

    /// `eth_getTransactionCount` at `pending`, so queued transactions are counted.
    async fn pending_nonce(&self, address: Address) -> Result<u64, ProviderError>;

    /// `eth_gasPrice`.
    async fn suggest_gas_price(&self) -> Result<Amount, ProviderError>;

    /// `eth_sendRawTransaction`. Returns the hash the node assigned.
    async fn send_raw_transaction(&self, raw_tx: Vec<u8>) -> Result<B256, ProviderError>;

    /// `eth_getBlockByNumber` with full transactions. `None` if the block
    /// does not exist yet.
    async fn block_by_number(&self, number: u64) -> Result<Option<Block>, ProviderError>;

    async fn transaction_by_hash(&self, hash: B256)
        -> Result<Option<TransactionInfo>, ProviderError>;

    /// `None` while the transaction is pending or unknown.
    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError>;

    async fn logs(&self, filter: LogFilter) -> Result<Vec<Log>, ProviderError>;

    /// `eth_call` against `latest`.
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Bytes, ProviderError>;
}
