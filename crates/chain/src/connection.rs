//! Chain connection abstraction and its HTTP implementation.
//!
//! The executor talks to the node through [`ChainConnection`] so the
//! submission state machine can be exercised against a mock chain in tests.
//! [`HttpChain`] implements it with Alloy providers built per call from the
//! RPC URL; the connection is safe for concurrent use by multiple in-flight
//! executions.

use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Node RPC failure.
#[derive(Debug, Error)]
pub enum ChainError {
    /// No usable response from the node (connection, timeout, decode).
    #[error("rpc transport failure: {0}")]
    Transport(String),

    /// The node answered and refused: nonce conflict, insufficient funds,
    /// underpriced, unknown method.
    #[error("node rejected request: {0}")]
    Rejected(String),
}

impl ChainError {
    fn from_rpc(e: RpcError<TransportErrorKind>) -> Self {
        match e {
            RpcError::ErrorResp(payload) => Self::Rejected(payload.message.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// EIP-1559 fee suggestion from the node.
#[derive(Debug, Clone, Copy)]
pub struct FeeEstimate {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Chain-confirmed record of a transaction's inclusion and outcome.
#[derive(Debug, Clone)]
pub struct SwapReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub gas_used: u64,
    /// `true` when execution succeeded, `false` when it reverted on-chain.
    pub status: bool,
}

/// Connection to a blockchain node.
///
/// One method per RPC the executor needs; `transaction_receipt` is a single
/// poll; the executor owns the wait loop and its cancellation.
#[async_trait]
pub trait ChainConnection: Send + Sync {
    /// Chain ID the node reports.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Next nonce for the address.
    async fn transaction_count(&self, address: Address) -> Result<u64, ChainError>;

    /// Gas estimate for the request.
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError>;

    /// Current fee suggestion.
    async fn estimate_fees(&self) -> Result<FeeEstimate, ChainError>;

    /// Broadcast a raw signed transaction; returns its hash.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError>;

    /// Look up the receipt for a hash, if the transaction is included yet.
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<SwapReceipt>, ChainError>;
}

/// HTTP JSON-RPC implementation of [`ChainConnection`].
#[derive(Debug, Clone)]
pub struct HttpChain {
    rpc_url: String,
}

impl HttpChain {
    /// Create a connection for the given RPC URL.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
        }
    }

    /// Get the RPC URL.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    fn provider(&self) -> Result<impl Provider, ChainError> {
        let url = self
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Transport(format!("invalid rpc url: {e}")))?;
        Ok(ProviderBuilder::new().on_http(url))
    }
}

#[async_trait]
impl ChainConnection for HttpChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        let provider = self.provider()?;
        provider.get_chain_id().await.map_err(ChainError::from_rpc)
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ChainError> {
        let provider = self.provider()?;
        provider
            .get_transaction_count(address)
            .await
            .map_err(ChainError::from_rpc)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError> {
        let provider = self.provider()?;
        provider
            .estimate_gas(tx.clone())
            .await
            .map_err(ChainError::from_rpc)
    }

    async fn estimate_fees(&self) -> Result<FeeEstimate, ChainError> {
        let provider = self.provider()?;
        let fees = provider
            .estimate_eip1559_fees()
            .await
            .map_err(ChainError::from_rpc)?;
        Ok(FeeEstimate {
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        })
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError> {
        let provider = self.provider()?;
        let pending = provider
            .send_raw_transaction(raw)
            .await
            .map_err(ChainError::from_rpc)?;
        let hash = *pending.tx_hash();
        debug!(tx_hash = %hash, "Raw transaction broadcast");
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<SwapReceipt>, ChainError> {
        let provider = self.provider()?;
        let receipt = provider
            .get_transaction_receipt(hash)
            .await
            .map_err(ChainError::from_rpc)?;
        Ok(receipt.map(|r| SwapReceipt {
            transaction_hash: r.transaction_hash,
            block_number: r.block_number.unwrap_or(0),
            gas_used: r.gas_used as u64,
            status: r.status(),
        }))
    }
}
