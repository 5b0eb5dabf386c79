use alloy_primitives::{Address, B256};
use alloy_rlp::{Encodable, RlpEncodable};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::PublicKey;
use sha3::{Digest, Keccak256};

use crate::address::address_from_public_key;
use crate::erc20;
use crate::error::EthError;
use crate::units::Amount;
use crate::wallet::PrivateKey;

/// Gas consumed by a plain value transfer to an account without code.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// An unsigned legacy (type 0) transaction, signed with EIP-155 replay
/// protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    /// Price per unit of gas, in wei.
    pub gas_price: Amount,
    pub gas_limit: u64,
    pub to: Address,
    /// Transfer value in wei.
    pub value: Amount,
    /// Calldata (empty for plain transfers).
    pub data: Vec<u8>,
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    /// RLP-encoded signed transaction.
    pub raw_tx: Vec<u8>,
    /// Keccak-256 of `raw_tx`.
    pub tx_hash: B256,
    /// EIP-155 `v`: `chain_id * 2 + 35 + y_parity`.
    pub v: u64,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl SignedTransaction {
    /// Lowercase `0x`-prefixed transaction hash.
    pub fn tx_hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.tx_hash))
    }

    /// Lowercase `0x`-prefixed raw transaction bytes.
    pub fn raw_tx_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw_tx))
    }
}

/// Builds a plain value transfer with the fixed [`TRANSFER_GAS_LIMIT`].
pub fn build_transfer(
    chain_id: u64,
    nonce: u64,
    to: Address,
    value: Amount,
    gas_price: Amount,
) -> LegacyTransaction {
    LegacyTransaction {
        chain_id,
        nonce,
        gas_price,
        gas_limit: TRANSFER_GAS_LIMIT,
        to,
        value,
        data: Vec::new(),
    }
}

/// Builds an ERC-20 `transfer(address,uint256)` call to `token_contract`.
pub fn build_erc20_transfer(
    chain_id: u64,
    nonce: u64,
    token_contract: Address,
    to: Address,
    amount: Amount,
    gas_price: Amount,
    gas_limit: u64,
) -> LegacyTransaction {
    LegacyTransaction {
        chain_id,
        nonce,
        gas_price,
        gas_limit,
        to: token_contract,
        value: Amount::ZERO,
        data: erc20::encode_transfer(to, amount),
    }
}

/// Encodes the EIP-155 signing payload:
/// `rlp([nonce, gas_price, gas_limit, to, value, data, chain_id, 0, 0])`.
pub fn encode_unsigned_tx(tx: &LegacyTransaction) -> Vec<u8> {
    let fields = UnsignedTxFields {
        nonce: tx.nonce,
        gas_price: RlpU256(tx.gas_price.to_be_bytes()),
        gas_limit: tx.gas_limit,
        to: RlpAddress(tx.to),
        value: RlpU256(tx.value.to_be_bytes()),
        data: RlpBytes(tx.data.clone()),
        chain_id: tx.chain_id,
        empty_r: 0,
        empty_s: 0,
    };

    let mut out = Vec::new();
    fields.encode(&mut out);
    out
}

/// Keccak-256 of the signing payload.
pub fn signing_hash(tx: &LegacyTransaction) -> B256 {
    B256::from_slice(&Keccak256::digest(encode_unsigned_tx(tx)))
}

/// Signs a legacy transaction with EIP-155 replay protection.
pub fn sign_transaction(
    tx: &LegacyTransaction,
    private_key: &PrivateKey,
) -> Result<SignedTransaction, EthError> {
    let msg_hash = signing_hash(tx);

    let signing_key = SigningKey::from(private_key.secret_key());
    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(msg_hash.as_slice())
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    let v = tx
        .chain_id
        .checked_mul(2)
        .and_then(|n| n.checked_add(35 + u64::from(recovery_id.is_y_odd())))
        .ok_or(EthError::UnsupportedChain(tx.chain_id))?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature.r().to_bytes());
    s.copy_from_slice(&signature.s().to_bytes());

    let fields = SignedTxFields {
        nonce: tx.nonce,
        gas_price: RlpU256(tx.gas_price.to_be_bytes()),
        gas_limit: tx.gas_limit,
        to: RlpAddress(tx.to),
        value: RlpU256(tx.value.to_be_bytes()),
        data: RlpBytes(tx.data.clone()),
        v,
        r: RlpU256(r),
        s: RlpU256(s),
    };

    let mut raw_tx = Vec::new();
    fields.encode(&mut raw_tx);
    let tx_hash = B256::from_slice(&Keccak256::digest(&raw_tx));

    Ok(SignedTransaction {
        raw_tx,
        tx_hash,
        v,
        r,
        s,
    })
}

/// Recovers the sender address from a signed transaction.
pub fn recover_signer(
    tx: &LegacyTransaction,
    signed: &SignedTransaction,
) -> Result<Address, EthError> {
    let parity = signed
        .v
        .checked_sub(35)
        .and_then(|n| n.checked_sub(tx.chain_id.checked_mul(2)?))
        .filter(|p| *p <= 1)
        .ok_or_else(|| EthError::SigningError(format!("unexpected v {}", signed.v)))?;

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signed.r);
    rs[32..].copy_from_slice(&signed.s);
    let signature =
        Signature::from_slice(&rs).map_err(|e| EthError::SigningError(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(parity as u8)
        .ok_or_else(|| EthError::SigningError("invalid recovery id".into()))?;

    let verifying_key =
        VerifyingKey::recover_from_prehash(signing_hash(tx).as_slice(), &signature, recovery_id)
            .map_err(|e| EthError::SigningError(e.to_string()))?;
    Ok(address_from_public_key(&PublicKey::from(&verifying_key)))
}

// ---------------------------------------------------------------------------
// RLP-encodable structures
// ---------------------------------------------------------------------------

#[derive(RlpEncodable)]
struct UnsignedTxFields {
    nonce: u64,
    gas_price: RlpU256,
    gas_limit: u64,
    to: RlpAddress,
    value: RlpU256,
    data: RlpBytes,
    chain_id: u64,
    empty_r: u8,
    empty_s: u8,
}

#[derive(RlpEncodable)]
struct SignedTxFields {
    nonce: u64,
    gas_price: RlpU256,
    gas_limit: u64,
    to: RlpAddress,
    value: RlpU256,
    data: RlpBytes,
    v: u64,
    r: RlpU256,
    s: RlpU256,
}

/// A 20-byte address encoded as an RLP string.
struct RlpAddress(Address);

impl Encodable for RlpAddress {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.0.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        self.0.as_slice().length()
    }
}

/// A 256-bit big-endian integer encoded with leading zeros stripped.
struct RlpU256([u8; 32]);

impl RlpU256 {
    fn trimmed(&self) -> &[u8] {
        let start = self.0.iter().position(|&b| b != 0).unwrap_or(32);
        &self.0[start..]
    }
}

impl Encodable for RlpU256 {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.trimmed().encode(out);
    }

    fn length(&self) -> usize {
        self.trimmed().length()
    }
}

/// Calldata encoded as an RLP string rather than a list of integers.
struct RlpBytes(Vec<u8>);

impl Encodable for RlpBytes {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.0.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        self.0.as_slice().length()
    }
}
