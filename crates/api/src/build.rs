//! Transaction construction via the `/v1/build` endpoint.

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::envelope::decode_envelope;
use crate::error::BuildError;
use crate::types::{QuoteData, UnsignedTransaction};
use crate::DEFAULT_BASE_URL;

/// Payload nested inside a successful build envelope.
#[derive(Debug, Deserialize)]
struct BuildData {
    transaction: UnsignedTransaction,
}

/// Client for the Hypersonic build endpoint.
///
/// The build request body is the quote re-serialized field-for-field: the
/// service re-derives the transaction from the fields it issued in the
/// quote (price, route, block number) and rejects altered or stale ones.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    http: reqwest::Client,
    base_url: String,
}

impl TransactionBuilder {
    /// Create a builder against the production endpoint.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build an unsigned transaction from a previously obtained quote.
    ///
    /// Exactly one outbound call. A [`BuildError::Rejected`] usually means
    /// chain state moved past the quoted block; the remedy is a fresh quote,
    /// not a retry of this call.
    #[instrument(skip(self, quote), fields(in_token = %quote.in_token, out_token = %quote.out_token))]
    pub async fn build_transaction(
        &self,
        quote: &QuoteData,
    ) -> Result<UnsignedTransaction, BuildError> {
        let url = format!("{}/v1/build", self.base_url);

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(quote)
            .send()
            .await
            .map_err(BuildError::Transport)?;

        let data: BuildData = decode_envelope(response).await?;

        debug!(to = %data.transaction.to, calldata_len = data.transaction.data.len(), "Transaction built");

        Ok(data.transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FixtureServer;
    use serde_json::Value;

    const QUOTE_FIXTURE: &str = r#"{
        "inToken": "0x0000000000000000000000000000000000000000",
        "outToken": "0x29219dd400f2bf60e5a23d13be72b486d4038894",
        "inAmount": "1000000000000000000",
        "outAmount": "703174",
        "minReceived": "696212",
        "route": [{"exchange": "shadow", "percent": 100, "data": "0x01"}],
        "to": "0x29219dd400f2bf60e5a23d13be72b486d4038895",
        "method": "hypersonicSwap",
        "blockNumber": 51234567,
        "quoteId": "q-8842"
    }"#;

    const BUILD_BODY: &str = r#"{"success": true, "data": {"transaction": {"to": "0x29219dd400f2bf60e5a23d13be72b486d4038895", "data": "0xabcdef01", "value": "1000000000000000000"}}}"#;

    #[tokio::test]
    async fn test_build_request_body_is_quote_verbatim() {
        let server = FixtureServer::serve(200, BUILD_BODY).await;
        let builder =
            TransactionBuilder::new(reqwest::Client::new()).with_base_url(&server.base_url);

        let quote: QuoteData = serde_json::from_str(QUOTE_FIXTURE).unwrap();
        let tx = builder.build_transaction(&quote).await.unwrap();

        // Round-trip identity: the outbound body equals the quote payload
        // exactly, unknown fields included.
        let sent = server.last_request();
        assert_eq!(sent.path, "/v1/build");
        assert_eq!(sent.body, serde_json::from_str::<Value>(QUOTE_FIXTURE).unwrap());
        assert_eq!(server.hits(), 1);

        assert_eq!(tx.to, "0x29219dd400f2bf60e5a23d13be72b486d4038895");
        assert_eq!(tx.value, "1000000000000000000");
    }

    #[tokio::test]
    async fn test_build_rejected_preserves_reason() {
        let server =
            FixtureServer::serve(200, r#"{"success": false, "error": "quote expired"}"#).await;
        let builder =
            TransactionBuilder::new(reqwest::Client::new()).with_base_url(&server.base_url);

        let quote: QuoteData = serde_json::from_str(QUOTE_FIXTURE).unwrap();
        let err = builder.build_transaction(&quote).await.unwrap_err();
        match err {
            BuildError::Rejected { reason } => assert_eq!(reason, "quote expired"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_build_missing_transaction_is_protocol_error() {
        let server = FixtureServer::serve(200, r#"{"success": true, "data": {}}"#).await;
        let builder =
            TransactionBuilder::new(reqwest::Client::new()).with_base_url(&server.base_url);

        let quote: QuoteData = serde_json::from_str(QUOTE_FIXTURE).unwrap();
        assert!(matches!(
            builder.build_transaction(&quote).await.unwrap_err(),
            BuildError::Protocol(_)
        ));
    }
}
