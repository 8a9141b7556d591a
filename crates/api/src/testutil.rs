//! In-process HTTP fixture server for client tests.
//!
//! Serves a canned response to every request on a loopback listener and
//! records what it received, so tests can assert on call counts and exact
//! request bodies without a live service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub(crate) struct FixtureServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<RecordedRequest>>>,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub path: String,
    pub body: Value,
}

impl FixtureServer {
    /// Spawn a server answering every request with `status` and `body`.
    pub async fn serve(status: u16, body: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.into();

        let hits = Arc::new(AtomicUsize::new(0));
        let last_request = Arc::new(Mutex::new(None));

        let task_hits = Arc::clone(&hits);
        let task_last = Arc::clone(&last_request);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                task_hits.fetch_add(1, Ordering::SeqCst);
                if let Some(recorded) = handle_connection(stream, status, &body).await {
                    *task_last.lock().unwrap() = Some(recorded);
                }
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            hits,
            last_request,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.last_request
            .lock()
            .unwrap()
            .clone()
            .expect("no request recorded")
    }
}

/// Return a loopback URL nothing is listening on (connection refused).
pub(crate) async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn handle_connection(
    mut stream: TcpStream,
    status: u16,
    body: &str,
) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    // Read the full request: headers, then Content-Length worth of body.
    let (header_end, content_length, path) = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_blank_line(&buf) {
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

    let request_body =
        serde_json::from_slice(&buf[header_end..header_end + content_length]).unwrap_or(Value::Null);

    let response = format!(
        "HTTP/1.1 {status} Fixture\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    stream.write_all(response.as_bytes()).await.ok()?;
    stream.shutdown().await.ok();

    Some(RecordedRequest {
        path,
        body: request_body,
    })
}

fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
