//! Hypersonic aggregation API clients.
//!
//! This crate provides HTTP clients for the two Hypersonic endpoints:
//! - `/v1/quote`: price and route discovery for a swap
//! - `/v1/build`: unsigned transaction construction from a quote
//!
//! Quote data is passed back to the build endpoint field-for-field; any
//! mutation between the two calls voids the service's pricing guarantees,
//! so [`QuoteData`] retains every field the service sent, including ones
//! this crate does not model.

mod build;
mod envelope;
mod error;
mod quote;
mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use build::TransactionBuilder;
pub use error::{BuildError, QuoteError};
pub use quote::QuoteClient;
pub use types::{QuoteData, QuoteRequest, UnsignedTransaction};

/// Production Hypersonic API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.hypersonic.exchange";
