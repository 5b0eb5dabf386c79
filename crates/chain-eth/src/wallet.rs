use std::fmt;

use alloy_primitives::Address;
use k256::SecretKey;
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::address::{address_from_public_key, to_checksum};
use crate::error::EthError;

/// A secp256k1 private key. The scalar is zeroed when dropped.
#[derive(Clone)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    /// Generates a fresh key from the operating system RNG.
    pub fn random() -> Self {
        Self(SecretKey::random(&mut OsRng))
    }

    /// Wraps a 32-byte big-endian scalar. Zero and values >= the curve order
    /// are rejected.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, EthError> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| EthError::InvalidPrivateKey("scalar out of range".into()))
    }

    /// Parses 64 hex characters, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, EthError> {
        let hex_str = s.trim();
        let hex_str = hex_str
            .strip_prefix("0x")
            .or_else(|| hex_str.strip_prefix("0X"))
            .unwrap_or(hex_str);

        if hex_str.len() != 64 {
            return Err(EthError::InvalidPrivateKey(format!(
                "expected 64 hex characters, got {}",
                hex_str.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(hex_str, bytes.as_mut_slice())
            .map_err(|e| EthError::InvalidPrivateKey(format!("invalid hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Lowercase hex of the scalar without a prefix.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0.to_bytes()))
    }

    /// Account address controlled by this key.
    pub fn address(&self) -> Address {
        address_from_public_key(&self.0.public_key())
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A keypair together with its derived account address.
#[derive(Debug, Clone)]
pub struct Wallet {
    private_key: PrivateKey,
    address: Address,
}

impl Wallet {
    /// Creates a wallet around a newly generated key.
    pub fn generate() -> Self {
        Self::from_private_key(PrivateKey::random())
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let address = private_key.address();
        Self {
            private_key,
            address,
        }
    }

    /// Imports a wallet from a hex private key (`0x` optional).
    pub fn from_private_key_hex(s: &str) -> Result<Self, EthError> {
        PrivateKey::from_hex(s).map(Self::from_private_key)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// EIP-55 checksummed address.
    pub fn address_hex(&self) -> String {
        to_checksum(&self.address)
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        self.private_key.to_hex()
    }
}
