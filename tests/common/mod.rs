//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

use prism_gateway::config::GatewayConfig;
use prism_gateway::lifecycle::Shutdown;
use prism_gateway::target::GatewayOrigin;
use prism_gateway::HttpServer;

/// What the mock origin received.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub path: String,
    /// Raw request head, lowercased.
    pub head: String,
}

impl MockRequest {
    pub fn has_header(&self, name: &str) -> bool {
        self.head.contains(&format!("\r\n{}:", name.to_ascii_lowercase()))
    }
}

/// How far a streamed mock body got.
#[derive(Default)]
pub struct WriteProgress {
    written: AtomicUsize,
    aborted: AtomicBool,
    done: Notify,
}

impl WriteProgress {
    /// Body bytes accepted by the socket so far.
    pub fn written(&self) -> usize {
        self.written.load(Ordering::SeqCst)
    }

    /// True once a write failed because the peer went away.
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Resolves when the origin stops writing, finished or not.
    pub async fn finished(&self) {
        self.done.notified().await
    }
}

/// Programmable origin response.
pub struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    parts: Vec<Vec<u8>>,
    /// Held between the first and second body part until notified.
    gate: Option<Arc<Notify>>,
    /// Advertised Content-Length, overriding the real one.
    declared_length: Option<usize>,
    /// Generated body of this many bytes, written in fixed chunks.
    streamed: Option<(usize, Arc<WriteProgress>)>,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            parts: vec![body.into()],
            gate: None,
            declared_length: None,
            streamed: None,
        }
    }

    /// A `total`-byte body generated on the fly, reporting into `progress`.
    pub fn streamed(content_type: &str, total: usize, progress: Arc<WriteProgress>) -> Self {
        let mut response = Self::new(200, Vec::new()).header("Content-Type", content_type);
        response.declared_length = Some(total);
        response.streamed = Some((total, progress));
        response
    }

    pub fn html(body: &str) -> Self {
        Self::new(200, body).header("Content-Type", "text/html; charset=utf-8")
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Send the body in two parts (close-delimited), waiting on `gate`
    /// between them.
    pub fn gated(mut self, second: impl Into<Vec<u8>>, gate: Arc<Notify>) -> Self {
        self.parts.push(second.into());
        self.gate = Some(gate);
        self
    }

    /// Claim a longer body than is sent, then close the connection.
    pub fn truncated(mut self, declared_length: usize) -> Self {
        self.declared_length = Some(declared_length);
        self
    }

    async fn write_to(self, socket: &mut TcpStream) -> std::io::Result<()> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason(self.status));
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        if self.gate.is_none() {
            let length = self
                .declared_length
                .unwrap_or_else(|| self.parts.iter().map(Vec::len).sum());
            head.push_str(&format!("Content-Length: {length}\r\n"));
        }
        head.push_str("Connection: close\r\n\r\n");
        socket.write_all(head.as_bytes()).await?;

        if let Some((total, progress)) = &self.streamed {
            let result = write_generated(socket, *total, progress).await;
            progress.aborted.store(result.is_err(), Ordering::SeqCst);
            progress.done.notify_one();
            return result;
        }

        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
            }
            socket.write_all(part).await?;
            socket.flush().await?;
        }
        socket.shutdown().await
    }
}

async fn write_generated(
    socket: &mut TcpStream,
    total: usize,
    progress: &WriteProgress,
) -> std::io::Result<()> {
    let chunk = vec![b'a'; 64 * 1024];
    let mut left = total;
    while left > 0 {
        let n = left.min(chunk.len());
        socket.write_all(&chunk[..n]).await?;
        progress.written.fetch_add(n, Ordering::SeqCst);
        left -= n;
    }
    socket.flush().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// A running mock origin.
pub struct MockOrigin {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockOrigin {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start an origin on an ephemeral port. `handler` maps each request to its
/// response.
pub async fn start_origin<F>(handler: F) -> MockOrigin
where
    F: Fn(&MockRequest) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let seen = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                seen.lock().unwrap().push(request.clone());
                let response = handler(&request);
                let _ = response.write_to(&mut socket).await;
            });
        }
    });

    MockOrigin { addr, requests }
}

/// An origin that accepts connections and never answers.
pub async fn start_silent_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 || buf.len() > 64 * 1024 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf).to_ascii_lowercase();
    let path = String::from_utf8_lossy(&buf)
        .split_whitespace()
        .nth(1)?
        .to_string();
    Some(MockRequest { path, head })
}

/// A gateway serving on an ephemeral port. Dropping it shuts the server down.
pub struct TestGateway {
    pub addr: SocketAddr,
    _shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// The proxy URL the gateway produces for `target`.
    pub fn proxy_url(&self, target: &str) -> String {
        GatewayOrigin::parse(&format!("http://{}", self.addr))
            .unwrap()
            .proxy_url(target)
            .into_string()
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    // The listener is already bound; give the accept loop a moment anyway.
    tokio::time::sleep(Duration::from_millis(20)).await;
    TestGateway {
        addr,
        _shutdown: shutdown,
    }
}

pub async fn start_default_gateway() -> TestGateway {
    start_gateway(GatewayConfig::default()).await
}
