//! Swap execution: sign, submit, await confirmation.
//!
//! The executor drives one unsigned transaction through
//! `Unsigned → Signed → Submitted → Confirmed | Failed`. Exactly one signed
//! transaction is produced per call; nothing is re-signed or resubmitted;
//! after a broadcast failure the caller decides whether to rebuild, because
//! a silent retry risks double-submission.

use std::time::Duration;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder as _;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use hypersonic_api::UnsignedTransaction;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::account::Account;
use crate::connection::{ChainConnection, ChainError, SwapReceipt};

/// Failure modes of swap execution, one per state-machine transition.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The transaction envelope could not be constructed or signed:
    /// malformed descriptor fields, a failed fill query, or the signing
    /// backend itself. Fatal for this call.
    #[error("failed to sign transaction: {0}")]
    Signing(String),

    /// The node refused the broadcast. Fatal for this call and never
    /// retried here; the caller decides whether to rebuild and resubmit.
    #[error("transaction broadcast rejected: {0}")]
    Submission(#[source] ChainError),

    /// The transaction was included but reverted on-chain. Distinct from
    /// [`Submission`](Self::Submission): the swap made it into a block.
    #[error("transaction {hash} reverted in block {block_number}")]
    Reverted { hash: B256, block_number: u64 },

    /// The caller cancelled the confirmation wait before a receipt arrived.
    /// The transaction may still land; `hash` identifies it.
    #[error("confirmation wait cancelled for transaction {hash}")]
    Cancelled { hash: B256 },
}

/// Executor for built swap transactions.
#[derive(Debug, Clone)]
pub struct SwapExecutor {
    poll_interval: Duration,
}

impl SwapExecutor {
    /// Create an executor with the default receipt poll interval (1s).
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Set the receipt poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sign, submit, and await confirmation of one unsigned transaction.
    ///
    /// The wait has no built-in timeout; `cancel` bounds it and is honored
    /// at every poll boundary. Cancellation never fabricates a receipt.
    #[instrument(skip_all, fields(to = %tx.to, from = %account.address()))]
    pub async fn execute_swap(
        &self,
        tx: &UnsignedTransaction,
        account: &Account,
        chain: &dyn ChainConnection,
        cancel: &CancellationToken,
    ) -> Result<SwapReceipt, ExecuteError> {
        // Unsigned → Signed
        let request = self.prepare(tx, account, chain).await?;
        let signed = request
            .build(&account.wallet())
            .await
            .map_err(|e| ExecuteError::Signing(format!("signer failed: {e}")))?;
        let raw = signed.encoded_2718();

        // Signed → Submitted
        let hash = chain
            .send_raw_transaction(&raw)
            .await
            .map_err(ExecuteError::Submission)?;

        info!(tx_hash = %hash, "Transaction submitted, waiting for confirmation");

        // Submitted → Confirmed | Failed
        self.wait_for_receipt(hash, chain, cancel).await
    }

    /// Build the chain-specific envelope: parse the descriptor fields and
    /// fill in what the chain requires and the builder left unset.
    /// Builder-provided gas parameters pass through untouched.
    async fn prepare(
        &self,
        tx: &UnsignedTransaction,
        account: &Account,
        chain: &dyn ChainConnection,
    ) -> Result<TransactionRequest, ExecuteError> {
        let to: Address = tx
            .to
            .parse()
            .map_err(|e| ExecuteError::Signing(format!("invalid destination {:?}: {e}", tx.to)))?;
        let calldata = decode_calldata(&tx.data)?;
        let value = parse_value(&tx.value)?;

        let mut request = TransactionRequest::default()
            .with_from(account.address())
            .with_to(to)
            .with_input(calldata)
            .with_value(value);

        if let Some(gas) = &tx.gas {
            request = request.with_gas_limit(parse_quantity("gas", gas)? as u64);
        }
        if let Some(gas_price) = &tx.gas_price {
            request = request.with_gas_price(parse_quantity("gasPrice", gas_price)?);
        }

        let chain_id = chain
            .chain_id()
            .await
            .map_err(|e| ExecuteError::Signing(format!("chain id query failed: {e}")))?;
        let nonce = chain
            .transaction_count(account.address())
            .await
            .map_err(|e| ExecuteError::Signing(format!("nonce query failed: {e}")))?;
        request = request.with_chain_id(chain_id).with_nonce(nonce);

        if tx.gas.is_none() {
            let gas = chain
                .estimate_gas(&request)
                .await
                .map_err(|e| ExecuteError::Signing(format!("gas estimation failed: {e}")))?;
            request = request.with_gas_limit(gas);
        }
        if tx.gas_price.is_none() {
            let fees = chain
                .estimate_fees()
                .await
                .map_err(|e| ExecuteError::Signing(format!("fee estimation failed: {e}")))?;
            request = request
                .with_max_fee_per_gas(fees.max_fee_per_gas)
                .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas);
        }

        debug!(
            nonce = nonce,
            chain_id = chain_id,
            value = %value,
            "Transaction envelope prepared"
        );

        Ok(request)
    }

    async fn wait_for_receipt(
        &self,
        hash: B256,
        chain: &dyn ChainConnection,
        cancel: &CancellationToken,
    ) -> Result<SwapReceipt, ExecuteError> {
        loop {
            match chain.transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    if receipt.status {
                        info!(
                            tx_hash = %hash,
                            block = receipt.block_number,
                            gas_used = receipt.gas_used,
                            "Transaction confirmed"
                        );
                        return Ok(receipt);
                    }
                    warn!(tx_hash = %hash, block = receipt.block_number, "Transaction reverted");
                    return Err(ExecuteError::Reverted {
                        hash,
                        block_number: receipt.block_number,
                    });
                }
                Ok(None) => {}
                // The transaction may still land; keep polling, the
                // caller's token bounds the wait.
                Err(e) => warn!(tx_hash = %hash, error = %e, "Receipt poll failed"),
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(ExecuteError::Cancelled { hash }),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

impl Default for SwapExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_calldata(data: &str) -> Result<Bytes, ExecuteError> {
    let hex_str = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(hex_str)
        .map_err(|e| ExecuteError::Signing(format!("invalid calldata hex: {e}")))?;
    Ok(Bytes::from(bytes))
}

/// Native value in wei. Empty or `"0"` means zero; decimal by default,
/// `0x`-prefixed hex accepted.
fn parse_value(value: &str) -> Result<U256, ExecuteError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return Ok(U256::ZERO);
    }
    let (digits, radix) = match trimmed.strip_prefix("0x") {
        Some(h) => (h, 16),
        None => (trimmed, 10),
    };
    U256::from_str_radix(digits, radix)
        .map_err(|e| ExecuteError::Signing(format!("invalid value {trimmed:?}: {e}")))
}

fn parse_quantity(field: &str, raw: &str) -> Result<u128, ExecuteError> {
    let trimmed = raw.trim();
    let (digits, radix) = match trimmed.strip_prefix("0x") {
        Some(h) => (h, 16),
        None => (trimmed, 10),
    };
    u128::from_str_radix(digits, radix)
        .map_err(|e| ExecuteError::Signing(format!("invalid {field} {trimmed:?}: {e}")))
}
