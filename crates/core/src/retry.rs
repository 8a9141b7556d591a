//! Retry decorator around the pipeline.
//!
//! No stage retries internally; this is the one retry site, and it always
//! restarts from quote retrieval so every attempt operates on fresh terms.
//! Execution-stage failures are final: a signed transaction may already be
//! in flight, and resubmitting it blind risks a double swap.

use std::time::Duration;

use hypersonic_api::QuoteRequest;
use hypersonic_chain::{Account, ChainConnection, SwapReceipt};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::pipeline::{PipelineError, SwapPipeline};

/// Backoff-and-retry policy for full pipeline runs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Set the first backoff delay.
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Set the backoff multiplier applied after each failed attempt.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Run the pipeline, restarting from a fresh quote on retryable
    /// failures until the attempt budget is spent.
    ///
    /// Cancellation is honored between attempts as well as inside the
    /// confirmation wait.
    pub async fn run(
        &self,
        pipeline: &SwapPipeline,
        request: &QuoteRequest,
        account: &Account,
        chain: &dyn ChainConnection,
        cancel: &CancellationToken,
    ) -> Result<SwapReceipt, PipelineError> {
        let mut backoff = self.initial_backoff;

        for attempt in 1..=self.max_attempts {
            match pipeline.swap(request, account, chain, cancel).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) if attempt < self.max_attempts && e.is_retryable() => {
                    warn!(
                        attempt = attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Swap attempt failed, retrying from a fresh quote"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(e),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = backoff.mul_f64(self.multiplier);
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("loop returns on the final attempt")
    }
}
