use std::fmt;
use std::path::PathBuf;

use chain_eth::EthError;
use thiserror::Error;

/// Failure of a call to the RPC provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never produced a JSON-RPC response (connect, timeout, HTTP status).
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node answered, but the payload could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport(e.to_string())
    }
}

/// Steps of a native transfer, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    ValidateInputs,
    FetchNonce,
    FetchGasPrice,
    Build,
    Sign,
    Submit,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStage::ValidateInputs => "validating inputs",
            TransferStage::FetchNonce => "fetching nonce",
            TransferStage::FetchGasPrice => "fetching gas price",
            TransferStage::Build => "building transaction",
            TransferStage::Sign => "signing",
            TransferStage::Submit => "submitting",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a transfer. None of these are retried internally.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Malformed recipient or amount; no network call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The provider failed while fetching the nonce or gas price.
    #[error("provider error while {stage}: {source}")]
    Provider {
        stage: TransferStage,
        #[source]
        source: ProviderError,
    },

    #[error("signing failed: {0}")]
    Signing(#[source] EthError),

    /// Broadcast failed. The node may or may not have accepted the
    /// transaction; re-query by hash to find out.
    #[error("submission failed: {0}")]
    Submission(#[source] ProviderError),
}

impl TransferError {
    /// The step at which the transfer stopped.
    pub fn stage(&self) -> TransferStage {
        match self {
            TransferError::InvalidInput(_) => TransferStage::ValidateInputs,
            TransferError::Provider { stage, .. } => *stage,
            TransferError::Signing(_) => TransferStage::Sign,
            TransferError::Submission(_) => TransferStage::Submit,
        }
    }
}

/// Invalid or unreadable node configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("no endpoint configured and chain {0} has no default")]
    NoEndpoint(u64),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
