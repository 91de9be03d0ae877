//! Shared utilities for integration testing.
//!
//! The mock upstream is a raw TCP server that records every request it
//! receives (head and body) so tests can assert on exactly what the relay
//! sent, and answers with a canned response.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use cors_relay::RelayConfig;
use cors_relay::HttpServer;

/// One request captured by the mock upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request line and headers, verbatim.
    pub head: String,
    /// Request body bytes.
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    /// Value of the last occurrence of a header, if any.
    pub fn header(&self, name: &str) -> Option<String> {
        let mut found = None;
        for line in self.head.lines().skip(1) {
            if let Some((key, value)) = line.split_once(':') {
                if key.trim().eq_ignore_ascii_case(name) {
                    found = Some(value.trim().to_string());
                }
            }
        }
        found
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

/// Requests captured by a mock upstream.
pub type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

/// Start a mock upstream that records every request and answers each with a
/// fixed status line, extra headers, and body.
pub async fn start_recording_upstream(
    status_line: &'static str,
    extra_headers: &'static [(&'static str, &'static str)],
    body: &'static str,
) -> (SocketAddr, Captured) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let store = captured.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let store = store.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    store.lock().await.push(request);
                    let mut response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                        status_line,
                        body.len()
                    );
                    for (name, value) in extra_headers {
                        response.push_str(&format!("{}: {}\r\n", name, value));
                    }
                    response.push_str("\r\n");
                    response.push_str(body);
                    let _ = socket.write_all(response.as_bytes()).await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, captured)
}

/// Start a mock upstream that drops the connection without answering when
/// the request path contains `/fail`, and answers 200 "ok" otherwise.
pub async fn start_flaky_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    if !request.request_line().contains("/fail") {
                        let _ = socket
                            .write_all(
                                b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                            )
                            .await;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start the relay on an ephemeral port, pointed at the given base URL.
pub async fn start_relay(base_url: String) -> SocketAddr {
    let mut config = RelayConfig::default();
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.upstream.base_url = base_url;

    let listener = TcpListener::bind(config.listener.bind_address())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    addr
}

/// Read one HTTP/1.1 request (head plus content-length body) off a socket.
async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];

    let head_end = loop {
        if let Some(pos) = find_head_end(&buffer) {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_string();
    let content_length = head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buffer[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Some(CapturedRequest { head, body })
}

fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}
