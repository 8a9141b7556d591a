//! The three-stage swap pipeline.

use hypersonic_api::{
    BuildError, QuoteClient, QuoteData, QuoteError, QuoteRequest, TransactionBuilder,
    UnsignedTransaction,
};
use hypersonic_chain::{Account, ChainConnection, ExecuteError, SwapExecutor, SwapReceipt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Failure of one pipeline stage, surfaced unchanged.
///
/// Wrapping is transparent: the originating error's kind and message are
/// what the caller sees, nothing is downgraded to a generic failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

impl PipelineError {
    /// Whether restarting the pipeline from a fresh quote can plausibly
    /// succeed.
    ///
    /// Transport failures and 5xx responses are transient; a rejected build
    /// usually means the quote went stale, which a fresh quote fixes. A
    /// rejected quote would be rejected again, and executor failures are
    /// never retryable here; a signed transaction may already be in flight.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Quote(e) => {
                matches!(e, QuoteError::Transport(_))
                    || matches!(e, QuoteError::Service { status, .. } if status.is_server_error())
            }
            Self::Build(e) => {
                matches!(e, BuildError::Transport(_) | BuildError::Rejected { .. })
                    || matches!(e, BuildError::Service { status, .. } if status.is_server_error())
            }
            Self::Execute(_) => false,
        }
    }
}

/// End-to-end swap pipeline: quote → build → execute.
///
/// Holds no state across calls; concurrent swaps over separate accounts
/// and connections are independent. Every field flowing into a stage
/// originates from the previous stage's output or the caller's request;
/// nothing is synthesized or reordered.
#[derive(Debug, Clone)]
pub struct SwapPipeline {
    quotes: QuoteClient,
    builder: TransactionBuilder,
    executor: SwapExecutor,
}

impl SwapPipeline {
    /// Create a pipeline sharing one HTTP client across both API stages.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            quotes: QuoteClient::new(http.clone()),
            builder: TransactionBuilder::new(http),
            executor: SwapExecutor::new(),
        }
    }

    /// Point both API stages at a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.quotes = self.quotes.with_base_url(base_url.clone());
        self.builder = self.builder.with_base_url(base_url);
        self
    }

    /// Replace the executor (e.g. to change the receipt poll interval).
    pub fn with_executor(mut self, executor: SwapExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Run the full pipeline for one swap.
    ///
    /// Aborts on the first stage failure; later stages are not entered.
    /// `cancel` bounds the confirmation wait in the execution stage.
    #[instrument(skip_all, fields(chain_id = request.chain_id, in_token = %request.in_token, out_token = %request.out_token))]
    pub async fn swap(
        &self,
        request: &QuoteRequest,
        account: &Account,
        chain: &dyn ChainConnection,
        cancel: &CancellationToken,
    ) -> Result<SwapReceipt, PipelineError> {
        let quote = self.quotes.get_quote(request).await?;
        info!(
            out_amount = %quote.out_amount,
            min_received = %quote.min_received,
            "Quote obtained"
        );

        let unsigned = self.builder.build_transaction(&quote).await?;
        info!(to = %unsigned.to, "Transaction built");

        let receipt = self
            .executor
            .execute_swap(&unsigned, account, chain, cancel)
            .await?;
        info!(
            tx_hash = %receipt.transaction_hash,
            block = receipt.block_number,
            "Swap confirmed"
        );

        Ok(receipt)
    }

    /// Run stages one and two only: obtain a quote and the unsigned
    /// transaction it builds to, without signing or submitting anything.
    pub async fn quote_and_build(
        &self,
        request: &QuoteRequest,
    ) -> Result<(QuoteData, UnsignedTransaction), PipelineError> {
        let quote = self.quotes.get_quote(request).await?;
        let unsigned = self.builder.build_transaction(&quote).await?;
        Ok((quote, unsigned))
    }
}
