pub mod abi;

use async_trait::async_trait;
use thiserror::Error;
use wp_api_types::{Address, Receipt, TxHash};

/// EIP-1193 code for "user rejected the request".
pub const USER_REJECTED: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("no injected wallet provider found")]
    NotInstalled,
    #[error("request rejected by user: {0}")]
    Rejected(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == USER_REJECTED {
            Self::Rejected(message)
        } else {
            Self::Rpc { code, message }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub to: Address,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topic0: [u8; 32],
    pub from_block: u64,
    pub to_block: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
    pub block_number: u64,
}

/// Account and transaction access through an injected browser wallet.
///
/// Futures are not `Send`: browser promises live on the main thread.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Accounts the visitor has already authorized. Never prompts.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;
    /// Ask the wallet to authorize this page.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn call(&self, req: CallRequest) -> Result<Vec<u8>, ProviderError>;
    /// The wallet signs and broadcasts; resolves with the hash once submitted.
    async fn send_transaction(&self, req: TxRequest) -> Result<TxHash, ProviderError>;
    /// Resolves once the transaction is mined.
    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ProviderError>;
    async fn block_number(&self) -> Result<u64, ProviderError>;
    async fn logs(&self, filter: LogFilter) -> Result<Vec<Log>, ProviderError>;
}
