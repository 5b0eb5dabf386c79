//! Offline Ethereum primitives for the toolkit.
//!
//! This crate provides:
//! - Wei/ether unit conversion with exact 256-bit arithmetic
//! - Syntactic address validation, EIP-55 checksums and key-to-address derivation
//! - secp256k1 wallet keypairs (generation, hex import/export)
//! - Legacy transaction building and EIP-155 signing
//! - ERC-20 calldata encoding and `Transfer` log decoding
//! - Known EVM network definitions

pub mod abi;
pub mod address;
pub mod chains;
pub mod erc20;
pub mod error;
pub mod transaction;
pub mod units;
pub mod wallet;

pub use alloy_primitives::{Address, B256, U256};
pub use error::EthError;
pub use units::{Amount, DisplayAmount};
pub use wallet::{PrivateKey, Wallet};
