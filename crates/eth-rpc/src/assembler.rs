//! Native-currency transfers: validate, price, build, sign, broadcast.
//!
//! Each [`TransferAssembler::transfer`] call walks the stages of
//! [`TransferStage`] in order and stops at the first failure. Nothing is
//! retried; a failed transfer is reported with the stage it reached.

use alloy_primitives::Address;
use chain_eth::address::{is_valid_address, parse_address};
use chain_eth::transaction::{build_transfer, sign_transaction, LegacyTransaction, SignedTransaction};
use chain_eth::units::ether_to_wei;
use chain_eth::{Amount, EthError, PrivateKey};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, TransferError, TransferStage};
use crate::provider::RpcProvider;

/// Turns a built transaction into signed bytes.
pub trait TransferSigner: Send + Sync {
    fn sign(
        &self,
        tx: &LegacyTransaction,
        key: &PrivateKey,
    ) -> Result<SignedTransaction, EthError>;
}

/// Legacy transaction signing with EIP-155 replay protection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip155Signer;

impl TransferSigner for Eip155Signer {
    fn sign(
        &self,
        tx: &LegacyTransaction,
        key: &PrivateKey,
    ) -> Result<SignedTransaction, EthError> {
        sign_transaction(tx, key)
    }
}

/// The transfer as it stood when it was broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub nonce: u64,
    pub gas_price: Amount,
    pub gas_limit: u64,
}

/// A broadcast transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransfer {
    pub request: TransferRequest,
    /// Lowercase `0x`-prefixed hash returned by the node.
    pub tx_hash: String,
}

pub struct TransferAssembler<P, S = Eip155Signer> {
    provider: P,
    signer: S,
    chain_id: u64,
}

impl<P: RpcProvider> TransferAssembler<P> {
    pub fn new(provider: P, chain_id: u64) -> Self {
        Self::with_signer(provider, Eip155Signer, chain_id)
    }
}

impl<P: RpcProvider, S: TransferSigner> TransferAssembler<P, S> {
    pub fn with_signer(provider: P, signer: S, chain_id: u64) -> Self {
        Self {
            provider,
            signer,
            chain_id,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Sends `amount` wei from the key's address to `to`.
    ///
    /// The recipient is validated before any network call. The nonce is the
    /// sender's pending nonce, so two transfers racing from the same sender
    /// can pick the same one; serialize them if that matters.
    pub async fn transfer(
        &self,
        key: &PrivateKey,
        to: &str,
        amount: Amount,
    ) -> Result<SignedTransfer, TransferError> {
        debug!(stage = %TransferStage::ValidateInputs, to, "starting transfer");
        let to = validate_recipient(to)?;
        let from = key.address();

        debug!(stage = %TransferStage::FetchNonce, %from);
        let nonce = self
            .provider
            .pending_nonce(from)
            .await
            .map_err(|source| provider_error(TransferStage::FetchNonce, source))?;

        debug!(stage = %TransferStage::FetchGasPrice, nonce);
        let gas_price = self
            .provider
            .suggest_gas_price()
            .await
            .map_err(|source| provider_error(TransferStage::FetchGasPrice, source))?;

        debug!(stage = %TransferStage::Build, %gas_price);
        let tx = build_transfer(self.chain_id, nonce, to, amount, gas_price);

        debug!(stage = %TransferStage::Sign);
        let signed = self.signer.sign(&tx, key).map_err(TransferError::Signing)?;

        debug!(stage = %TransferStage::Submit, local_hash = %signed.tx_hash_hex());
        let node_hash = self
            .provider
            .send_raw_transaction(signed.raw_tx.clone())
            .await
            .map_err(TransferError::Submission)?;
        if node_hash != signed.tx_hash {
            warn!(
                local = %signed.tx_hash_hex(),
                node = %node_hash,
                "node reported a different transaction hash"
            );
        }

        let tx_hash = format!("0x{}", hex::encode(node_hash));
        info!(%tx_hash, %from, %to, %amount, nonce, "transfer submitted");

        Ok(SignedTransfer {
            request: TransferRequest {
                from,
                to,
                amount,
                nonce,
                gas_price,
                gas_limit: tx.gas_limit,
            },
            tx_hash,
        })
    }

    /// Like [`transfer`](Self::transfer), taking the amount in ether.
    pub async fn transfer_ether(
        &self,
        key: &PrivateKey,
        to: &str,
        ether: f64,
    ) -> Result<SignedTransfer, TransferError> {
        let amount =
            ether_to_wei(ether).map_err(|e| TransferError::InvalidInput(e.to_string()))?;
        self.transfer(key, to, amount).await
    }
}

fn validate_recipient(to: &str) -> Result<Address, TransferError> {
    if !is_valid_address(to) {
        return Err(TransferError::InvalidInput(format!(
            "invalid recipient address: {to:?}"
        )));
    }
    parse_address(to).map_err(|e| TransferError::InvalidInput(e.to_string()))
}

fn provider_error(stage: TransferStage, source: ProviderError) -> TransferError {
    TransferError::Provider { stage, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockRpcProvider;
    use alloy_primitives::B256;
    use chain_eth::transaction::recover_signer;
    use chain_eth::units::GWEI_DECIMALS;
    use chain_eth::units::parse_units;

    const RECIPIENT: &str = "0x3535353535353535353535353535353535353535";
    const CHAIN_ID: u64 = 11155111;

    fn test_key() -> PrivateKey {
        PrivateKey::from_bytes(&[0x46; 32]).unwrap()
    }

    fn one_gwei() -> Amount {
        parse_units("1", GWEI_DECIMALS).unwrap()
    }

    fn expected_signed(nonce: u64, amount: Amount) -> SignedTransaction {
        let to = parse_address(RECIPIENT).unwrap();
        let tx = build_transfer(CHAIN_ID, nonce, to, amount, one_gwei());
        sign_transaction(&tx, &test_key()).unwrap()
    }

    struct FailingSigner;

    impl TransferSigner for FailingSigner {
        fn sign(
            &self,
            _tx: &LegacyTransaction,
            _key: &PrivateKey,
        ) -> Result<SignedTransaction, EthError> {
            Err(EthError::SigningError("hardware wallet disconnected".into()))
        }
    }

    #[tokio::test]
    async fn transfer_happy_path() {
        let key = test_key();
        let sender = key.address();
        let amount = Amount::from(1_000_000_000_000_000u64);
        let expected = expected_signed(7, amount);
        let expected_raw = expected.raw_tx.clone();
        let expected_hash = expected.tx_hash;

        let mut provider = MockRpcProvider::new();
        provider
            .expect_pending_nonce()
            .withf(move |address| *address == sender)
            .times(1)
            .returning(|_| Ok(7));
        provider
            .expect_suggest_gas_price()
            .times(1)
            .returning(|| Ok(parse_units("1", GWEI_DECIMALS).unwrap()));
        provider
            .expect_send_raw_transaction()
            .withf(move |raw| *raw == expected_raw)
            .times(1)
            .returning(move |_| Ok(expected_hash));

        let assembler = TransferAssembler::new(provider, CHAIN_ID);
        let sent = assembler.transfer(&key, RECIPIENT, amount).await.unwrap();

        assert_eq!(sent.tx_hash, expected.tx_hash_hex());
        assert_eq!(sent.tx_hash, sent.tx_hash.to_lowercase());
        assert!(sent.tx_hash.starts_with("0x"));
        assert_eq!(sent.tx_hash.len(), 66);
        assert_eq!(sent.request.from, sender);
        assert_eq!(sent.request.nonce, 7);
        assert_eq!(sent.request.gas_limit, 21_000);
        assert_eq!(sent.request.gas_price, one_gwei());
        assert_eq!(sent.request.amount, amount);
    }

    #[tokio::test]
    async fn broadcast_bytes_recover_to_sender() {
        let key = test_key();
        let amount = Amount::from(5u64);
        let captured = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = captured.clone();

        let mut provider = MockRpcProvider::new();
        provider.expect_pending_nonce().returning(|_| Ok(0));
        provider
            .expect_suggest_gas_price()
            .returning(|| Ok(Amount::from(1u64)));
        provider.expect_send_raw_transaction().returning(move |raw| {
            *sink.lock().unwrap() = raw;
            Ok(B256::repeat_byte(0xab))
        });

        let assembler = TransferAssembler::new(provider, CHAIN_ID);
        let sent = assembler.transfer(&key, RECIPIENT, amount).await.unwrap();
        assert_eq!(sent.tx_hash, format!("0x{}", "ab".repeat(32)));

        let to = parse_address(RECIPIENT).unwrap();
        let tx = build_transfer(CHAIN_ID, 0, to, amount, Amount::from(1u64));
        let signed = sign_transaction(&tx, &key).unwrap();
        assert_eq!(*captured.lock().unwrap(), signed.raw_tx);
        assert_eq!(recover_signer(&tx, &signed).unwrap(), key.address());
    }

    #[tokio::test]
    async fn invalid_recipient_makes_no_calls() {
        for bad in [
            "",
            "0x123",
            "3535353535353535353535353535353535353535",
            "0x353535353535353535353535353535353535353g",
            "0x35353535353535353535353535353535353535355",
        ] {
            let mut provider = MockRpcProvider::new();
            provider.expect_pending_nonce().times(0);
            provider.expect_suggest_gas_price().times(0);
            provider.expect_send_raw_transaction().times(0);

            let assembler = TransferAssembler::new(provider, CHAIN_ID);
            let err = assembler
                .transfer(&test_key(), bad, Amount::from(1u64))
                .await
                .unwrap_err();
            assert!(matches!(err, TransferError::InvalidInput(_)), "{bad:?}");
            assert_eq!(err.stage(), TransferStage::ValidateInputs);
        }
    }

    #[tokio::test]
    async fn invalid_ether_amount_makes_no_calls() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let mut provider = MockRpcProvider::new();
            provider.expect_pending_nonce().times(0);

            let assembler = TransferAssembler::new(provider, CHAIN_ID);
            let err = assembler
                .transfer_ether(&test_key(), RECIPIENT, bad)
                .await
                .unwrap_err();
            assert_eq!(err.stage(), TransferStage::ValidateInputs, "{bad}");
        }
    }

    #[tokio::test]
    async fn nonce_failure_stops_before_gas_price() {
        let mut provider = MockRpcProvider::new();
        provider
            .expect_pending_nonce()
            .times(1)
            .returning(|_| Err(ProviderError::Transport("connection refused".into())));
        provider.expect_suggest_gas_price().times(0);
        provider.expect_send_raw_transaction().times(0);

        let assembler = TransferAssembler::new(provider, CHAIN_ID);
        let err = assembler
            .transfer(&test_key(), RECIPIENT, Amount::from(1u64))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), TransferStage::FetchNonce);
        assert!(matches!(
            err,
            TransferError::Provider {
                source: ProviderError::Transport(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn gas_price_failure_stops_before_signing() {
        let mut provider = MockRpcProvider::new();
        provider.expect_pending_nonce().returning(|_| Ok(3));
        provider.expect_suggest_gas_price().times(1).returning(|| {
            Err(ProviderError::Rpc {
                code: -32603,
                message: "internal error".into(),
            })
        });
        provider.expect_send_raw_transaction().times(0);

        let assembler = TransferAssembler::new(provider, CHAIN_ID);
        let err = assembler
            .transfer(&test_key(), RECIPIENT, Amount::from(1u64))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), TransferStage::FetchGasPrice);
    }

    #[tokio::test]
    async fn signing_failure_is_not_submitted() {
        let mut provider = MockRpcProvider::new();
        provider.expect_pending_nonce().returning(|_| Ok(0));
        provider
            .expect_suggest_gas_price()
            .returning(|| Ok(Amount::from(1u64)));
        provider.expect_send_raw_transaction().times(0);

        let assembler = TransferAssembler::with_signer(provider, FailingSigner, CHAIN_ID);
        let err = assembler
            .transfer(&test_key(), RECIPIENT, Amount::from(1u64))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Signing(_)));
        assert_eq!(err.stage(), TransferStage::Sign);
    }

    #[tokio::test]
    async fn broadcast_failure_is_submission_error() {
        let mut provider = MockRpcProvider::new();
        provider.expect_pending_nonce().returning(|_| Ok(0));
        provider
            .expect_suggest_gas_price()
            .returning(|| Ok(Amount::from(1u64)));
        provider.expect_send_raw_transaction().times(1).returning(|_| {
            Err(ProviderError::Rpc {
                code: -32000,
                message: "insufficient funds for gas * price + value".into(),
            })
        });

        let assembler = TransferAssembler::new(provider, CHAIN_ID);
        let err = assembler
            .transfer(&test_key(), RECIPIENT, Amount::from(1u64))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), TransferStage::Submit);
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn zero_amount_is_allowed() {
        let mut provider = MockRpcProvider::new();
        provider.expect_pending_nonce().returning(|_| Ok(0));
        provider
            .expect_suggest_gas_price()
            .returning(|| Ok(Amount::from(1u64)));
        provider
            .expect_send_raw_transaction()
            .returning(|_| Ok(B256::ZERO));

        let assembler = TransferAssembler::new(provider, CHAIN_ID);
        let sent = assembler
            .transfer(&test_key(), RECIPIENT, Amount::ZERO)
            .await
            .unwrap();
        assert!(sent.request.amount.is_zero());
    }
}
