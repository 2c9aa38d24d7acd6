//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One request observed by the mock upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Network-call spy: records every request the upstream receives, so tests
/// can assert a rejection produced zero outbound connections.
#[derive(Clone, Default)]
pub struct UpstreamSpy {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl UpstreamSpy {
    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: CapturedRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

/// Start a mock upstream that records requests and answers with `body` plus
/// the headers a proxy is expected to strip.
pub async fn start_recording_upstream(body: &'static str) -> (SocketAddr, UpstreamSpy) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let spy = UpstreamSpy::default();
    let recorder = spy.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let recorder = recorder.clone();
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }
                        if let Some(request) = parse_request_head(&buf) {
                            recorder.record(request);
                        }
                        let response = format!(
                            "HTTP/1.1 200 OK\r\n\
                             Content-Length: {}\r\n\
                             Content-Type: text/plain\r\n\
                             Server: mock-upstream/1.0\r\n\
                             X-Powered-By: mock\r\n\
                             Set-Cookie: session=abc123\r\n\
                             Connection: close\r\n\
                             \r\n\
                             {}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, spy)
}

fn parse_request_head(buf: &[u8]) -> Option<CapturedRequest> {
    let head = String::from_utf8_lossy(buf);
    let mut lines = head.split("\r\n");

    let request_line = lines.next()?;
    let mut parts = request_line.split(' ');
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    Some(CapturedRequest {
        method,
        path,
        headers,
    })
}
