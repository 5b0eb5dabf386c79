use alloy_primitives::{Address, B256};

use crate::abi::{self, encode_function_call, AbiParam};
use crate::error::EthError;
use crate::units::Amount;

/// Function selector for `transfer(address,uint256)`: `0xa9059cbb`.
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Function selector for `balanceOf(address)`: `0x70a08231`.
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Function selector for `decimals()`: `0x313ce567`.
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// Function selector for `name()`: `0x06fdde03`.
pub const NAME_SELECTOR: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];

/// Function selector for `symbol()`: `0x95d89b41`.
pub const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];

/// `keccak256("Transfer(address,address,uint256)")`, the first topic of every
/// ERC-20 `Transfer` log.
pub const TRANSFER_EVENT_TOPIC: B256 = B256::new([
    0xdd, 0xf2, 0x52, 0xad, 0x1b, 0xe2, 0xc8, 0x9b, 0x69, 0xc2, 0xb0, 0x68, 0xfc, 0x37, 0x8d, 0xaa,
    0x95, 0x2b, 0xa7, 0xf1, 0x63, 0xc4, 0xa1, 0x16, 0x28, 0xf5, 0x5a, 0x4d, 0xf5, 0x23, 0xb3, 0xef,
]);

/// Encodes `transfer(to, amount)` calldata.
pub fn encode_transfer(to: Address, amount: Amount) -> Vec<u8> {
    let params = [AbiParam::Address(to), AbiParam::Uint256(amount.as_wei())];
    encode_function_call(TRANSFER_SELECTOR, &params)
}

/// Encodes `balanceOf(owner)` calldata.
pub fn encode_balance_of(owner: Address) -> Vec<u8> {
    encode_function_call(BALANCE_OF_SELECTOR, &[AbiParam::Address(owner)])
}

/// Encodes `decimals()` calldata.
pub fn encode_decimals() -> Vec<u8> {
    encode_function_call(DECIMALS_SELECTOR, &[])
}

pub fn encode_name() -> Vec<u8> {
    encode_function_call(NAME_SELECTOR, &[])
}

pub fn encode_symbol() -> Vec<u8> {
    encode_function_call(SYMBOL_SELECTOR, &[])
}

/// Decodes the result of `name()` or `symbol()`.
///
/// Some early tokens return `bytes32` instead of `string`; a result of
/// exactly one word is read as NUL-padded text.
pub fn decode_text(data: &[u8]) -> Result<String, EthError> {
    if data.len() != abi::WORD_LEN {
        return abi::decode_string(data);
    }
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8(data[..end].to_vec())
        .map_err(|e| EthError::EncodingError(format!("bytes32 text is not UTF-8: {e}")))
}

/// Decodes the single `uint256` returned by `balanceOf`.
pub fn decode_balance(data: &[u8]) -> Result<Amount, EthError> {
    abi::decode_uint256(abi::word_at(data, 0)?).map(Amount::from_wei)
}

/// Decodes the `uint8` returned by `decimals()`.
pub fn decode_decimals(data: &[u8]) -> Result<u8, EthError> {
    let value = abi::decode_uint256(abi::word_at(data, 0)?)?;
    u8::try_from(value)
        .map_err(|_| EthError::EncodingError(format!("decimals out of range: {value}")))
}

/// A decoded ERC-20 `Transfer(address indexed from, address indexed to, uint256 value)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: Amount,
}

impl TransferEvent {
    /// Decodes a `Transfer` log from its topics and data.
    ///
    /// `from` and `to` are indexed and live in `topics[1]` and `topics[2]`;
    /// `value` is the single data word. Logs whose first topic is not
    /// [`TRANSFER_EVENT_TOPIC`] are rejected, as are ERC-721 transfers, which
    /// share the signature but index the token id and carry no data.
    pub fn decode(topics: &[B256], data: &[u8]) -> Result<Self, EthError> {
        match topics.first() {
            Some(topic) if *topic == TRANSFER_EVENT_TOPIC => {}
            _ => {
                return Err(EthError::EncodingError(
                    "log is not an ERC-20 Transfer event".into(),
                ))
            }
        }
        if topics.len() != 3 {
            return Err(EthError::EncodingError(format!(
                "Transfer event expects 3 topics, got {}",
                topics.len()
            )));
        }

        Ok(Self {
            from: abi::decode_address(topics[1].as_slice())?,
            to: abi::decode_address(topics[2].as_slice())?,
            value: Amount::from_wei(abi::decode_uint256(abi::word_at(data, 0)?)?),
        })
    }
}
