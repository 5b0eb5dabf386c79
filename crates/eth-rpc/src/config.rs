use std::path::Path;
use std::time::Duration;

use chain_eth::chains::{self, EvmChain};
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Where to reach the node and which chain it serves.
///
/// Read from TOML with camelCase keys:
///
/// ```toml
/// endpoint = "https://rpc.sepolia.org"
/// chainId = 11155111
/// requestTimeoutSecs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub endpoint: Url,
    pub chain_id: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl NodeConfig {
    pub fn new(endpoint: Url, chain_id: u64) -> Self {
        Self {
            endpoint,
            chain_id,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Builds a config for `chain_id`, using `endpoint` if given and the
    /// chain's public RPC URL otherwise.
    pub fn for_chain(chain_id: u64, endpoint: Option<&str>) -> Result<Self, ConfigError> {
        let url = match endpoint.map(str::trim).filter(|s| !s.is_empty()) {
            Some(url) => url.to_string(),
            None => chains::get_chain(chain_id)
                .map(|chain| chain.rpc_url.to_string())
                .ok_or(ConfigError::NoEndpoint(chain_id))?,
        };
        Ok(Self::new(parse_endpoint(&url)?, chain_id))
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Known metadata for the configured chain, if any.
    pub fn chain(&self) -> Option<&'static EvmChain> {
        chains::get_chain(self.chain_id)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        check_scheme(&self.endpoint)?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Parse(
                "requestTimeoutSecs must be greater than zero".into(),
            ));
        }
        Ok(self)
    }
}

fn parse_endpoint(s: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(s).map_err(|e| ConfigError::InvalidEndpoint {
        url: s.to_string(),
        reason: e.to_string(),
    })?;
    check_scheme(&url)?;
    Ok(url)
}

// Only HTTP transport is implemented.
fn check_scheme(url: &Url) -> Result<(), ConfigError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidEndpoint {
            url: url.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}
