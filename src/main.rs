//! Hypersonic swap pipeline CLI.
//!
//! Example caller wiring the pipeline from environment variables:
//! quote and build always run; signing and submission are opt-in via
//! `HYPERSONIC_EXECUTE=1` so a misconfigured shell can't move funds.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hypersonic_api::QuoteRequest;
use hypersonic_chain::{Account, HttpChain};
use hypersonic_core::{RetryPolicy, SwapPipeline};
use tokio_util::sync::CancellationToken;

/// Environment variable names.
mod env {
    pub const API_URL: &str = "HYPERSONIC_API_URL";
    pub const RPC_URL: &str = "RPC_URL";
    pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
    pub const CHAIN_ID: &str = "CHAIN_ID";
    pub const IN_TOKEN: &str = "IN_TOKEN";
    pub const OUT_TOKEN: &str = "OUT_TOKEN";
    pub const IN_AMOUNT: &str = "IN_AMOUNT";
    pub const SLIPPAGE: &str = "SLIPPAGE";
    pub const REF_CODE: &str = "REF_CODE";
    pub const EXECUTE: &str = "HYPERSONIC_EXECUTE";
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hypersonic_api=debug,hypersonic_chain=debug")),
        )
        .init();

    let config = load_config()?;

    info!("Starting Hypersonic swap pipeline");
    info!(chain_id = config.chain_id, execute = config.execute, "Configuration loaded");

    let http = reqwest::Client::new();
    let mut pipeline = SwapPipeline::new(http);
    if let Some(api_url) = &config.api_url {
        pipeline = pipeline.with_base_url(api_url.clone());
    }

    let mut request = QuoteRequest::new(
        config.chain_id,
        config.in_token,
        config.out_token,
        config.in_amount.clone(),
    )
    .with_slippage(config.slippage);
    if let Some(ref_code) = config.ref_code {
        request = request.with_ref_code(ref_code);
    }

    if !config.execute {
        // Dry run: quote and build only, nothing is signed or submitted
        let (quote, unsigned) = pipeline.quote_and_build(&request).await?;
        info!(
            out_amount = %quote.out_amount,
            min_received = %quote.min_received,
            block_number = quote.block_number,
            "Quote obtained"
        );
        info!(
            to = %unsigned.to,
            calldata_len = unsigned.data.len(),
            "Transaction built; set HYPERSONIC_EXECUTE=1 to sign and submit"
        );
        return Ok(());
    }

    let private_key = config
        .private_key
        .context("PRIVATE_KEY is required when HYPERSONIC_EXECUTE=1")?;
    let account = Account::from_private_key(&private_key)?;
    let rpc_url = config
        .rpc_url
        .context("RPC_URL is required when HYPERSONIC_EXECUTE=1")?;
    let chain = HttpChain::new(rpc_url);

    // Ctrl-C cancels the confirmation wait instead of killing the process
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling confirmation wait");
            ctrl_c_cancel.cancel();
        }
    });

    let receipt = RetryPolicy::default()
        .run(&pipeline, &request, &account, &chain, &cancel)
        .await?;

    info!(
        tx_hash = %receipt.transaction_hash,
        block = receipt.block_number,
        gas_used = receipt.gas_used,
        "Swap completed"
    );

    Ok(())
}

/// Configuration loaded from environment.
struct Config {
    api_url: Option<String>,
    rpc_url: Option<String>,
    private_key: Option<String>,
    chain_id: u64,
    in_token: alloy::primitives::Address,
    out_token: alloy::primitives::Address,
    in_amount: String,
    slippage: f64,
    ref_code: Option<u64>,
    execute: bool,
}

fn load_config() -> Result<Config> {
    let get_env = |name: &str| std::env::var(name).ok();

    let parse_address = |name: &str, default: &str| -> Result<alloy::primitives::Address> {
        get_env(name)
            .unwrap_or_else(|| default.to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid address for {}: {}", name, e))
    };

    Ok(Config {
        api_url: get_env(env::API_URL),
        rpc_url: get_env(env::RPC_URL),
        private_key: get_env(env::PRIVATE_KEY),
        chain_id: get_env(env::CHAIN_ID)
            .map(|v| v.parse())
            .transpose()
            .context("Invalid CHAIN_ID")?
            .unwrap_or(146), // Sonic
        // Defaults swap 1 S into USDC.e on Sonic
        in_token: parse_address(env::IN_TOKEN, "0x0000000000000000000000000000000000000000")?,
        out_token: parse_address(env::OUT_TOKEN, "0x29219dd400f2bf60e5a23d13be72b486d4038894")?,
        in_amount: get_env(env::IN_AMOUNT).unwrap_or_else(|| "1000000000000000000".to_string()),
        slippage: get_env(env::SLIPPAGE)
            .map(|v| v.parse())
            .transpose()
            .context("Invalid SLIPPAGE")?
            .unwrap_or(1.0),
        ref_code: get_env(env::REF_CODE)
            .map(|v| v.parse())
            .transpose()
            .context("Invalid REF_CODE")?,
        execute: get_env(env::EXECUTE).as_deref() == Some("1"),
    })
}
