//! Request and response types for the Hypersonic API.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters for requesting a swap quote.
///
/// Invariants (distinct tokens, positive amount, sane slippage) are owned
/// and enforced by the service; a violation surfaces as
/// [`QuoteError::Rejected`](crate::QuoteError::Rejected) rather than a
/// local validation error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Network ID for the chain (e.g. 146 for Sonic)
    pub chain_id: u64,
    /// Input token address
    pub in_token: Address,
    /// Output token address
    pub out_token: Address,
    /// Input amount in token base units (decimal string)
    pub in_amount: String,
    /// Slippage tolerance in percent (e.g. 0.5 = 0.5%)
    pub slippage: f64,
    /// Optional referral code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_code: Option<u64>,
}

impl QuoteRequest {
    /// Create a new quote request with the default slippage tolerance.
    pub fn new(
        chain_id: u64,
        in_token: Address,
        out_token: Address,
        in_amount: impl Into<String>,
    ) -> Self {
        Self {
            chain_id,
            in_token,
            out_token,
            in_amount: in_amount.into(),
            slippage: 0.5,
            ref_code: None,
        }
    }

    /// Set the slippage tolerance in percent.
    pub fn with_slippage(mut self, slippage: f64) -> Self {
        self.slippage = slippage;
        self
    }

    /// Set the referral code.
    pub fn with_ref_code(mut self, ref_code: u64) -> Self {
        self.ref_code = Some(ref_code);
        self
    }
}

/// A quote computed by the aggregation service.
///
/// The pipeline treats this as an opaque payload: the typed fields below are
/// the ones callers commonly inspect, and `extra` captures everything else
/// the service sent. Serializing a `QuoteData` reproduces the original
/// payload field-for-field, which is what the build endpoint requires, since it
/// re-derives the transaction from the same fields it issued in the quote
/// and rejects altered or stale ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    /// Input token address
    pub in_token: String,
    /// Output token address
    pub out_token: String,
    /// Input amount in base units (decimal string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_amount: Option<String>,
    /// Expected output amount in base units (decimal string)
    pub out_amount: String,
    /// Minimum output after slippage (decimal string)
    pub min_received: String,
    /// Input token decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_decimals: Option<u8>,
    /// Output token decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_decimals: Option<u8>,
    /// Percent-weighted swap legs. Exchange-specific and never interpreted
    /// locally; kept verbatim for the build request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Value>,
    /// Target contract the built transaction will call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Contract method identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Block number the quote was computed against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Fields the service sent that this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Unsigned transaction descriptor returned by the build endpoint.
///
/// The executor fills in whatever the chain requires (nonce, gas, fees)
/// and the builder left unset; fields present here pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    /// Destination contract address
    pub to: String,
    /// Hex-encoded calldata (`0x`-prefixed)
    pub data: String,
    /// Native value in wei (decimal string; empty or absent means zero)
    #[serde(default)]
    pub value: String,
    /// Gas limit, if the service chose one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    /// Legacy gas price, if the service chose one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}
