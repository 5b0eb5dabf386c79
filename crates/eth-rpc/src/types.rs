//! Response and request shapes for the JSON-RPC methods the toolkit uses.
//!
//! Nodes encode numeric quantities as `0x`-prefixed hex strings without
//! leading zeros; the `quantity` helpers convert them to native integers.

use alloy_primitives::{Address, Bytes, B256, U256};
use chain_eth::Amount;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::ProviderError;

/// Parses a hex quantity (`"0x1b4"`) into a `u64`.
pub fn parse_quantity_u64(s: &str) -> Result<u64, ProviderError> {
    let digits = quantity_digits(s)?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::InvalidResponse(format!("bad quantity {s:?}: {e}")))
}

/// Parses a hex quantity into a 256-bit integer.
pub fn parse_quantity_u256(s: &str) -> Result<U256, ProviderError> {
    let digits = quantity_digits(s)?;
    U256::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::InvalidResponse(format!("bad quantity {s:?}: {e}")))
}

/// Formats a block number or count as a hex quantity.
pub fn to_quantity(value: u64) -> String {
    format!("{value:#x}")
}

fn quantity_digits(s: &str) -> Result<&str, ProviderError> {
    match s.strip_prefix("0x") {
        Some(digits) if !digits.is_empty() => Ok(digits),
        _ => Err(ProviderError::InvalidResponse(format!(
            "expected hex quantity, got {s:?}"
        ))),
    }
}

mod quantity {
    use super::*;
    use serde::de::{Deserializer, Error};

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let s = String::deserialize(d)?;
        parse_quantity_u64(&s).map_err(D::Error::custom)
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| parse_quantity_u64(&s).map_err(D::Error::custom))
            .transpose()
    }

    pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        let s = String::deserialize(d)?;
        parse_quantity_u256(&s)
            .map(Amount::from_wei)
            .map_err(D::Error::custom)
    }

    pub fn opt_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Amount>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| {
                parse_quantity_u256(&s)
                    .map(Amount::from_wei)
                    .map_err(D::Error::custom)
            })
            .transpose()
    }
}

/// A block returned by `eth_getBlockByNumber` with full transaction objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(deserialize_with = "quantity::number")]
    pub number: u64,
    pub hash: Option<B256>,
    /// Unix seconds.
    #[serde(deserialize_with = "quantity::number")]
    pub timestamp: u64,
    #[serde(deserialize_with = "quantity::number")]
    pub gas_used: u64,
    #[serde(deserialize_with = "quantity::number")]
    pub gas_limit: u64,
    #[serde(default)]
    pub transactions: Vec<TransactionInfo>,
}

/// A transaction as reported by `eth_getTransactionByHash` or embedded in a block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    pub hash: B256,
    #[serde(deserialize_with = "quantity::number")]
    pub nonce: u64,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    #[serde(deserialize_with = "quantity::amount")]
    pub value: Amount,
    #[serde(deserialize_with = "quantity::number")]
    pub gas: u64,
    #[serde(default, deserialize_with = "quantity::opt_amount")]
    pub gas_price: Option<Amount>,
    /// `None` while the transaction is still pending.
    #[serde(default, deserialize_with = "quantity::opt_number")]
    pub block_number: Option<u64>,
}

impl TransactionInfo {
    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(deserialize_with = "quantity::number")]
    pub block_number: u64,
    #[serde(deserialize_with = "quantity::number")]
    pub gas_used: u64,
    /// `1` on success, `0` on revert. Absent on pre-Byzantium receipts.
    #[serde(default, deserialize_with = "quantity::opt_number")]
    pub status: Option<u64>,
    pub contract_address: Option<Address>,
}

impl TransactionReceipt {
    /// `Some(true)` if the transaction executed successfully, `None` if the
    /// receipt predates the status field.
    pub fn succeeded(&self) -> Option<bool> {
        self.status.map(|s| s == 1)
    }
}

/// An event log entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default, deserialize_with = "quantity::opt_number")]
    pub block_number: Option<u64>,
    pub transaction_hash: Option<B256>,
    #[serde(default, deserialize_with = "quantity::opt_number")]
    pub log_index: Option<u64>,
}

/// Filter for `eth_getLogs`. Unset bounds default to `latest` on the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub address: Option<Address>,
    /// Positional topic filters; `None` matches any value in that slot.
    pub topics: Vec<Option<B256>>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = Some(block);
        self
    }

    pub fn to_block(mut self, block: u64) -> Self {
        self.to_block = Some(block);
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn topic0(mut self, topic: B256) -> Self {
        if self.topics.is_empty() {
            self.topics.push(Some(topic));
        } else {
            self.topics[0] = Some(topic);
        }
        self
    }

    /// The filter object passed as the single `eth_getLogs` parameter.
    pub fn to_params(&self) -> Value {
        let mut obj = Map::new();
        if let Some(from) = self.from_block {
            obj.insert("fromBlock".into(), json!(to_quantity(from)));
        }
        if let Some(to) = self.to_block {
            obj.insert("toBlock".into(), json!(to_quantity(to)));
        }
        if let Some(address) = self.address {
            obj.insert("address".into(), json!(address));
        }
        if !self.topics.is_empty() {
            obj.insert("topics".into(), json!(self.topics));
        }
        Value::Object(obj)
    }
}
