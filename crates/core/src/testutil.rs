//! Test doubles for pipeline tests: a scripted HTTP fixture server and a
//! stub chain connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, B256};
use async_trait::async_trait;
use hypersonic_api::QuoteRequest;
use hypersonic_chain::{Account, ChainConnection, ChainError, FeeEstimate, SwapReceipt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub(crate) const QUOTE_OK: &str = r#"{"success": true, "data": {"inToken": "0x0000000000000000000000000000000000000000", "outToken": "0x29219dd400f2bf60e5a23d13be72b486d4038894", "inAmount": "1000000000000000000", "outAmount": "703174", "minReceived": "696212", "blockNumber": 51234567}}"#;

pub(crate) const BUILD_OK: &str = r#"{"success": true, "data": {"transaction": {"to": "0x29219dd400f2bf60e5a23d13be72b486d4038895", "data": "0xabcdef01", "value": ""}}}"#;

// Well-known test private key (DO NOT USE IN PRODUCTION)
const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub(crate) fn request() -> QuoteRequest {
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

/// HTTP server answering from per-path response scripts.
///
/// Each hit on a path consumes the next scripted response; the final one
/// repeats. Unknown paths get a 404.
pub(crate) struct ScriptedServer {
    pub base_url: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl ScriptedServer {
    pub async fn serve(routes: Vec<(&'static str, Vec<(u16, String)>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::new(Mutex::new(HashMap::new()));
        let scripts: HashMap<String, Vec<(u16, String)>> = routes
            .into_iter()
            .map(|(path, responses)| (path.to_string(), responses))
            .collect();

        let task_hits = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let _ = handle_request(stream, &scripts, &task_hits).await;
            }
        });

        Self { base_url: format!("http://{addr}"), hits }
    }

    pub fn hits(&self, path: &str) -> usize {
        *self.hits.lock().unwrap().get(path).unwrap_or(&0)
    }
}

async fn handle_request(
    mut stream: TcpStream,
    scripts: &HashMap<String, Vec<(u16, String)>>,
    hits: &Arc<Mutex<HashMap<String, usize>>>,
) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let (header_end, content_length, path) = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..pos]).to_string();
            let path = headers
                .lines()
                .next()?
                .split_whitespace()
                .nth(1)?
                .to_string();
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            break (pos + 4, content_length, path);
        }
    };
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let hit_index = {
        let mut hits = hits.lock().unwrap();
        let counter = hits.entry(path.clone()).or_insert(0);
        *counter += 1;
        *counter - 1
    };

    let (status, body) = match scripts.get(&path) {
        Some(responses) => {
            let index = hit_index.min(responses.len() - 1);
            responses[index].clone()
        }
        None => (404, r#"{"detail": "not found"}"#.to_string()),
    };

    let response = format!(
        "HTTP/1.1 {status} Fixture\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    stream.write_all(response.as_bytes()).await.ok()?;
    stream.shutdown().await.ok();
    Some(path)
}

/// Chain double with a happy default path.
#[derive(Default)]
pub(crate) struct StubChain {
    /// Broadcasts fail with a node rejection when set
    reject_send: bool,
    sends: AtomicUsize,
}

impl StubChain {
    /// A chain whose node refuses every broadcast.
    pub fn rejecting() -> Self {
        Self {
            reject_send: true,
            sends: AtomicUsize::new(0),
        }
    }

    pub fn account() -> Account {
        Account::from_private_key(TEST_KEY).unwrap()
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainConnection for StubChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(146)
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64, ChainError> {
        Ok(0)
    }

    async fn estimate_gas(
        &self,
        _tx: &alloy::rpc::types::TransactionRequest,
    ) -> Result<u64, ChainError> {
        Ok(210_000)
    }

    async fn estimate_fees(&self) -> Result<FeeEstimate, ChainError> {
        Ok(FeeEstimate {
            max_fee_per_gas: 2_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        })
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if self.reject_send {
            return Err(ChainError::Rejected("insufficient funds".to_string()));
        }
        Ok(keccak256(raw))
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<SwapReceipt>, ChainError> {
        Ok(Some(SwapReceipt {
            transaction_hash: hash,
            block_number: 51234570,
            gas_used: 180_000,
            status: true,
        }))
    }
}
