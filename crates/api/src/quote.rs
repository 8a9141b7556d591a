//! Quote retrieval from the `/v1/quote` endpoint.

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use crate::envelope::decode_envelope;
use crate::error::QuoteError;
use crate::types::{QuoteData, QuoteRequest};
use crate::DEFAULT_BASE_URL;

/// Client for the Hypersonic quote endpoint.
///
/// Holds an injected [`reqwest::Client`] so connection pools are shared and
/// configured by the caller, not ambiently. Performs exactly one attempt per
/// call; retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl QuoteClient {
    /// Create a client against the production endpoint.
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

    /// Fetch a quote for the given request.
    ///
    /// Exactly one outbound call. The returned payload is the service's
    /// `data` object, unmodified; it is the only valid input for
    /// [`TransactionBuilder::build_transaction`](crate::TransactionBuilder::build_transaction).
    #[instrument(skip(self, request), fields(chain_id = request.chain_id, in_token = %request.in_token, out_token = %request.out_token))]
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteData, QuoteError> {
        let url = format!("{}/v1/quote", self.base_url);

        debug!(in_amount = %request.in_amount, slippage = request.slippage, "Requesting quote");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(QuoteError::Transport)?;

        let quote: QuoteData = decode_envelope(response).await?;

        debug!(
            out_amount = %quote.out_amount,
            min_received = %quote.min_received,
            block_number = quote.block_number,
            "Quote obtained"
        );

        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{unreachable_url, FixtureServer};
    use alloy::primitives::Address;
    use serde_json::Value;

    fn request() -> QuoteRequest {
        QuoteRequest::new(
            146,
            Address::ZERO,
            "0x29219dd400f2bf60e5a23d13be72b486d4038894"
                .parse()
                .unwrap(),
            "1000000000000000000",
        )
        .with_slippage(1.0)
    }

    const SUCCESS_BODY: &str = r#"{"success": true, "data": {"inToken": "0xA", "outToken": "0xB", "outAmount": "703174", "minReceived": "696212"}, "timestamp": "2026-08-07T12:00:00Z"}"#;

    #[tokio::test]
    async fn test_get_quote_returns_payload_unaltered() {
        let server = FixtureServer::serve(200, SUCCESS_BODY).await;
        let client = QuoteClient::new(reqwest::Client::new()).with_base_url(&server.base_url);

        let quote = client.get_quote(&request()).await.unwrap();
        assert_eq!(quote.min_received, "696212");

        // Field-for-field identity against the fixture's data object
        let fixture: Value = serde_json::from_str(SUCCESS_BODY).unwrap();
        assert_eq!(serde_json::to_value(&quote).unwrap(), fixture["data"]);

        // Exactly one network call, to the quote path
        assert_eq!(server.hits(), 1);
        assert_eq!(server.last_request().path, "/v1/quote");
    }

    #[tokio::test]
    async fn test_get_quote_sends_camel_case_body() {
        let server = FixtureServer::serve(200, SUCCESS_BODY).await;
        let client = QuoteClient::new(reqwest::Client::new()).with_base_url(&server.base_url);

        client.get_quote(&request()).await.unwrap();

        let body = server.last_request().body;
        assert_eq!(body["chainId"], 146);
        assert_eq!(body["inAmount"], "1000000000000000000");
        assert!(body.get("refCode").is_none());
    }

    #[tokio::test]
    async fn test_get_quote_rejected() {
        let server =
            FixtureServer::serve(200, r#"{"success": false, "error": "no route found"}"#).await;
        let client = QuoteClient::new(reqwest::Client::new()).with_base_url(&server.base_url);

        let err = client.get_quote(&request()).await.unwrap_err();
        match err {
            QuoteError::Rejected { reason } => assert_eq!(reason, "no route found"),
            other => panic!("expected Rejected, got {other:?}"),
        }
        // Rejection performs no further calls
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_get_quote_service_error() {
        let server = FixtureServer::serve(503, r#"{"detail": "maintenance"}"#).await;
        let client = QuoteClient::new(reqwest::Client::new()).with_base_url(&server.base_url);

        let err = client.get_quote(&request()).await.unwrap_err();
        match err {
            QuoteError::Service { status, body } => {
                assert_eq!(status.as_u16(), 503);
                assert!(body.contains("maintenance"));
            }
            other => panic!("expected Service, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_quote_protocol_errors_fail_closed() {
        // Undecodable body
        let server = FixtureServer::serve(200, "not json at all").await;
        let client = QuoteClient::new(reqwest::Client::new()).with_base_url(&server.base_url);
        assert!(matches!(
            client.get_quote(&request()).await.unwrap_err(),
            QuoteError::Protocol(_)
        ));

        // Success envelope with no data payload
        let server = FixtureServer::serve(200, r#"{"success": true}"#).await;
        let client = QuoteClient::new(reqwest::Client::new()).with_base_url(&server.base_url);
        assert!(matches!(
            client.get_quote(&request()).await.unwrap_err(),
            QuoteError::Protocol(_)
        ));
    }

    #[tokio::test]
    async fn test_get_quote_transport_error() {
        let client = QuoteClient::new(reqwest::Client::new()).with_base_url(unreachable_url().await);
        assert!(matches!(
            client.get_quote(&request()).await.unwrap_err(),
            QuoteError::Transport(_)
        ));
    }
}
