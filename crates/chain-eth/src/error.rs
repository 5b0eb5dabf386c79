use thiserror::Error;

/// Errors raised by the offline Ethereum primitives. None of them involve
/// the network.
#[derive(Debug, Error)]
pub enum EthError {
    /// Not 32 bytes of hex, or zero / above the curve order.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Fails the `0x` + 40 hex digit shape.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Negative, non-finite, unparsable, or beyond 256 bits of wei.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("signing failed: {0}")]
    SigningError(String),

    /// Malformed ABI word or log, or an RLP value out of range.
    #[error("malformed encoding: {0}")]
    EncodingError(String),

    /// The chain id is too large to fit the EIP-155 `v` value.
    #[error("chain id {0} cannot be used for EIP-155 signing")]
    UnsupportedChain(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_input() {
        let cases = [
            (
                EthError::InvalidAddress("0xINVALID".into()),
                "invalid address: 0xINVALID",
            ),
            (
                EthError::InvalidAmount("negative value -1".into()),
                "invalid amount: negative value -1",
            ),
            (
                EthError::EncodingError("word 2 out of bounds".into()),
                "malformed encoding: word 2 out of bounds",
            ),
            (
                EthError::UnsupportedChain(u64::MAX),
                "chain id 18446744073709551615 cannot be used for EIP-155 signing",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn converts_into_boxed_error() {
        let err: Box<dyn std::error::Error + Send + Sync> =
            Box::new(EthError::SigningError("bad prehash".into()));
        assert_eq!(err.to_string(), "signing failed: bad prehash");
    }
}
