//! ABI encoding and decoding for static 32-byte words.
//!
//! Covers what ERC-20 calls and `Transfer` logs need: addresses, `uint256`
//! values, function selectors and event topics. The only dynamic type
//! handled is a single returned `string`.

use alloy_primitives::{Address, B256, U256};
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Size of one ABI word.
pub const WORD_LEN: usize = 32;

/// A single static ABI parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiParam {
    /// Left-padded to 32 bytes.
    Address(Address),
    /// Big-endian 32 bytes.
    Uint256(U256),
}

/// First four bytes of the Keccak-256 of a function signature such as
/// `transfer(address,uint256)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Keccak-256 of an event signature; the log's `topics[0]`.
pub fn event_topic(signature: &str) -> B256 {
    B256::from_slice(&Keccak256::digest(signature.as_bytes()))
}

/// Encodes `selector || word(params[0]) || word(params[1]) || ...`.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + params.len() * WORD_LEN);
    data.extend_from_slice(&selector);
    for param in params {
        data.extend_from_slice(&encode_param(param));
    }
    data
}

fn encode_param(param: &AbiParam) -> [u8; WORD_LEN] {
    match param {
        AbiParam::Address(address) => {
            let mut word = [0u8; WORD_LEN];
            word[12..].copy_from_slice(address.as_slice());
            word
        }
        AbiParam::Uint256(value) => value.to_be_bytes::<WORD_LEN>(),
    }
}

/// Reads the word at `index` from ABI-encoded data.
pub fn word_at(data: &[u8], index: usize) -> Result<&[u8], EthError> {
    let start = index * WORD_LEN;
    data.get(start..start + WORD_LEN).ok_or_else(|| {
        EthError::EncodingError(format!(
            "expected at least {} bytes for word {index}, got {}",
            start + WORD_LEN,
            data.len()
        ))
    })
}

/// Decodes a left-padded address word. The 12 padding bytes must be zero.
pub fn decode_address(word: &[u8]) -> Result<Address, EthError> {
    if word.len() != WORD_LEN {
        return Err(EthError::EncodingError(format!(
            "address word must be {WORD_LEN} bytes, got {}",
            word.len()
        )));
    }
    if word[..12].iter().any(|&b| b != 0) {
        return Err(EthError::EncodingError(
            "address word has non-zero padding".into(),
        ));
    }
    Ok(Address::from_slice(&word[12..]))
}

/// Decodes a big-endian `uint256` word.
pub fn decode_uint256(word: &[u8]) -> Result<U256, EthError> {
    if word.len() != WORD_LEN {
        return Err(EthError::EncodingError(format!(
            "uint256 word must be {WORD_LEN} bytes, got {}",
            word.len()
        )));
    }
    Ok(U256::from_be_slice(word))
}

/// Decodes a `string` that is the sole return value of a call: an offset
/// word, then a length word at that offset, then the UTF-8 bytes.
pub fn decode_string(data: &[u8]) -> Result<String, EthError> {
    let offset = word_to_usize(word_at(data, 0)?, "string offset")?;
    let len_word = data
        .get(offset..)
        .and_then(|rest| rest.get(..WORD_LEN))
        .ok_or_else(|| EthError::EncodingError(format!("string offset {offset} out of bounds")))?;
    let len = word_to_usize(len_word, "string length")?;

    let start = offset + WORD_LEN;
    let bytes = start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| {
            EthError::EncodingError(format!(
                "string of {len} bytes overruns {} bytes of data",
                data.len()
            ))
        })?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| EthError::EncodingError(format!("string is not UTF-8: {e}")))
}

fn word_to_usize(word: &[u8], what: &str) -> Result<usize, EthError> {
    let value = decode_uint256(word)?;
    usize::try_from(value).map_err(|_| EthError::EncodingError(format!("{what} too large: {value}")))
}
