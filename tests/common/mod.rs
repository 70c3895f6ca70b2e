//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use edge_gateway::cache::{CacheStore, MemoryStore};
use edge_gateway::config::{CacheBackend, GatewayConfig, PoolsConfig, RouteConfig};
use edge_gateway::http::Services;
use edge_gateway::security::RemoteTokenValidator;
use edge_gateway::{GatewayServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What a mock backend saw on the wire.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request line and headers, exactly as received.
    pub head: String,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// A raw-TCP HTTP/1.1 backend on an ephemeral port.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a backend that answers every request with `status` and `body`.
pub async fn start_mock_backend(status: u16, body: &'static str) -> MockBackend {
    start_programmable_backend(move |_| (status, body.to_string())).await
}

/// Start a backend whose response is computed from the captured request.
pub async fn start_programmable_backend<F>(respond: F) -> MockBackend
where
    F: Fn(&CapturedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = MockBackend {
        addr: listener.local_addr().unwrap(),
        requests: Arc::default(),
        hits: Arc::default(),
    };
    let respond = Arc::new(respond);

    let state = backend.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let state = state.clone();
            let respond = Arc::clone(&respond);
            tokio::spawn(async move {
                serve_one(socket, &state, respond.as_ref()).await;
            });
        }
    });

    backend
}

async fn serve_one<F>(mut socket: TcpStream, state: &MockBackend, respond: &F)
where
    F: Fn(&CapturedRequest) -> (u16, String),
{
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buffer, b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_string();
    let mut captured = CapturedRequest {
        head,
        body: buffer[head_end + 4..].to_vec(),
    };
    let length: usize = captured
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while captured.body.len() < length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => captured.body.extend_from_slice(&chunk[..n]),
        }
    }

    let (status, body) = respond(&captured);
    state.requests.lock().unwrap().push(captured);
    state.hits.fetch_add(1, Ordering::SeqCst);
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason(status),
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Gateway config with the given pools, `/session` routed to `session`,
/// everything else to `user`, auth off and an in-memory cache.
pub fn gateway_config(session: &[String], user: &[String]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();

    let mut pools = PoolsConfig::empty();
    pools.insert("session", session.to_vec());
    pools.insert("user", user.to_vec());
    config.pools = pools;
    config.routes = vec![RouteConfig {
        name: "session".into(),
        path_prefix: "/session".into(),
        pool: "session".into(),
        priority: 10,
    }];

    config.cache.backend = CacheBackend::Memory;
    config.auth.enabled = false;
    config.timeouts.upstream_secs = 2;
    config
}

/// Services with an in-memory store and a validator pointed at the config.
pub fn memory_services(config: &GatewayConfig) -> Services {
    services_with_store(config, Arc::new(MemoryStore::new()))
}

pub fn services_with_store(config: &GatewayConfig, store: Arc<dyn CacheStore>) -> Services {
    Services {
        store,
        validator: Arc::new(RemoteTokenValidator::from_config(&config.auth).unwrap()),
        metrics: None,
    }
}

/// A gateway listening on an ephemeral port.
pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_gateway(config: GatewayConfig, services: Services) -> RunningGateway {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(config, services).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let task = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;
    RunningGateway { addr, shutdown, task }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
