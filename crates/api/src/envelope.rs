//! Response envelope decoding shared by both endpoints.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Wire envelope wrapping every Hypersonic response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[allow(dead_code)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Stage-agnostic envelope failure; each client maps this into its own
/// error type so the stage is visible in the error kind.
#[derive(Debug)]
pub(crate) enum EnvelopeFailure {
    Transport(reqwest::Error),
    Service {
        status: reqwest::StatusCode,
        body: String,
    },
    Rejected {
        reason: String,
    },
    Protocol(String),
}

/// Decode a response into the payload of a success envelope.
///
/// Fails closed: an undecodable body, or a `success: true` envelope with no
/// `data`, is a protocol failure rather than a partially-populated value.
pub(crate) async fn decode_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, EnvelopeFailure> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EnvelopeFailure::Service { status, body });
    }

    let body = response.text().await.map_err(EnvelopeFailure::Transport)?;
    let envelope: ApiEnvelope<T> = serde_json::from_str(&body)
        .map_err(|e| EnvelopeFailure::Protocol(format!("undecodable envelope: {e}")))?;

    if !envelope.success {
        let reason = envelope
            .error
            .unwrap_or_else(|| "service did not include an explanation".to_string());
        return Err(EnvelopeFailure::Rejected { reason });
    }

    envelope
        .data
        .ok_or_else(|| EnvelopeFailure::Protocol("success envelope missing data payload".into()))
}
