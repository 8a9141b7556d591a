//! Per-stage error taxonomy for the two Hypersonic endpoints.
//!
//! Both stages distinguish the same four failure classes: transport (no
//! response obtained), HTTP-level service failure, application-level
//! rejection inside a well-formed envelope, and a malformed envelope.
//! Neither client retries internally; retry policy is layered on top of
//! the pipeline by the caller.

use reqwest::StatusCode;
use thiserror::Error;

use crate::envelope::EnvelopeFailure;

/// Failure modes of the quote stage.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// No response was obtained (connection refused, timeout, DNS).
    /// Retryable by the caller.
    #[error("quote request failed in transport")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("quote service returned HTTP {status}: {body}")]
    Service { status: StatusCode, body: String },

    /// Well-formed envelope with `success: false`; the request itself was
    /// invalid or no route exists. The service's explanation is preserved.
    #[error("quote rejected: {reason}")]
    Rejected { reason: String },

    /// The response body could not be decoded into the expected envelope.
    #[error("malformed quote response: {0}")]
    Protocol(String),
}

/// Failure modes of the build stage.
///
/// `Rejected` here most commonly means the quote went stale: chain state
/// moved past the quoted block. Staleness is the service's call, not a
/// local expiry clock.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No response was obtained. Retryable by the caller.
    #[error("build request failed in transport")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("build service returned HTTP {status}: {body}")]
    Service { status: StatusCode, body: String },

    /// Well-formed envelope with `success: false`.
    #[error("build rejected: {reason}")]
    Rejected { reason: String },

    /// The response body could not be decoded into the expected envelope.
    #[error("malformed build response: {0}")]
    Protocol(String),
}

impl From<EnvelopeFailure> for QuoteError {
    fn from(failure: EnvelopeFailure) -> Self {
        match failure {
            EnvelopeFailure::Transport(e) => Self::Transport(e),
            EnvelopeFailure::Service { status, body } => Self::Service { status, body },
            EnvelopeFailure::Rejected { reason } => Self::Rejected { reason },
            EnvelopeFailure::Protocol(message) => Self::Protocol(message),
        }
    }
}

impl From<EnvelopeFailure> for BuildError {
    fn from(failure: EnvelopeFailure) -> Self {
        match failure {
            EnvelopeFailure::Transport(e) => Self::Transport(e),
            EnvelopeFailure::Service { status, body } => Self::Service { status, body },
            EnvelopeFailure::Rejected { reason } => Self::Rejected { reason },
            EnvelopeFailure::Protocol(message) => Self::Protocol(message),
        }
    }
}
