//! Node access for the toolkit.
//!
//! - [`RpcProvider`]: the async seam every network operation goes through
//! - [`HttpProvider`]: JSON-RPC 2.0 over HTTP
//! - [`TransferAssembler`]: staged native transfers with typed failures
//! - [`NodeConfig`]: endpoint and chain selection
//! - [`BlockCursor`]: block range bookkeeping for polling loops

pub mod assembler;
pub mod config;
pub mod cursor;
pub mod error;
pub mod http;
pub mod provider;
pub mod types;

pub use assembler::{Eip155Signer, SignedTransfer, TransferAssembler, TransferRequest, TransferSigner};
pub use config::NodeConfig;
pub use cursor::BlockCursor;
pub use error::{ConfigError, ProviderError, TransferError, TransferStage};
pub use http::HttpProvider;
pub use provider::RpcProvider;
pub use types::{Block, Log, LogFilter, TransactionInfo, TransactionReceipt};
