use alloy_primitives::Address;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Length of a textual address: `0x` followed by 40 hex characters.
pub const ADDRESS_TEXT_LEN: usize = 42;

/// Reports whether `s` is a syntactically valid `0x`-prefixed hex address.
///
/// The rules are checked in order and all must hold:
/// 1. the string is exactly 42 bytes long;
/// 2. it starts with a lowercase `0x`;
/// 3. the remaining 40 bytes are ASCII hex digits of either case.
///
/// No EIP-55 checksum is verified here; see [`has_valid_checksum`].
pub fn is_valid_address(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != ADDRESS_TEXT_LEN {
        return false;
    }
    if &bytes[..2] != b"0x" {
        return false;
    }
    bytes[2..].iter().all(u8::is_ascii_hexdigit)
}

/// Parses a textual address into its 20-byte form.
///
/// Accepts exactly what [`is_valid_address`] accepts.
pub fn parse_address(s: &str) -> Result<Address, EthError> {
    if !is_valid_address(s) {
        return Err(EthError::InvalidAddress(s.to_string()));
    }

    let bytes =
        hex::decode(&s[2..]).map_err(|e| EthError::InvalidAddress(format!("{s}: {e}")))?;
    Ok(Address::from_slice(&bytes))
}

/// Derives the account address of a secp256k1 public key.
///
/// The address is the last 20 bytes of the Keccak-256 hash of the 64-byte
/// uncompressed key (the `0x04` SEC1 tag is not hashed).
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.to_encoded_point(false);
    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Derives an address from an uncompressed SEC1 public key (65 bytes, `0x04` tag).
pub fn pubkey_to_eth_address(uncompressed_pubkey: &[u8; 65]) -> Result<Address, EthError> {
    if uncompressed_pubkey[0] != 0x04 {
        return Err(EthError::InvalidPublicKey(
            "uncompressed key must start with 0x04".into(),
        ));
    }

    let public_key = PublicKey::from_sec1_bytes(uncompressed_pubkey)
        .map_err(|e| EthError::InvalidPublicKey(e.to_string()))?;
    Ok(address_from_public_key(&public_key))
}

/// Renders an address with the EIP-55 mixed-case checksum.
pub fn to_checksum(address: &Address) -> String {
    let lower = hex::encode(address.as_slice());
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(ADDRESS_TEXT_LEN);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Applies EIP-55 checksum casing to a textual address.
pub fn checksum_address(s: &str) -> Result<String, EthError> {
    parse_address(s).map(|address| to_checksum(&address))
}

/// Verifies the EIP-55 checksum of a syntactically valid address.
///
/// All-lowercase and all-uppercase addresses carry no checksum and are
/// accepted. Returns `false` for syntactically invalid input.
pub fn has_valid_checksum(s: &str) -> bool {
    let Ok(address) = parse_address(s) else {
        return false;
    };

    let hex_part = &s[2..];
    let is_all_lower = !hex_part.bytes().any(|b| b.is_ascii_uppercase());
    let is_all_upper = !hex_part.bytes().any(|b| b.is_ascii_lowercase());
    if is_all_lower || is_all_upper {
        return true;
    }

    to_checksum(&address) == s
}
